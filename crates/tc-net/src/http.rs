//! Reqwest-backed transport
//!
//! Each request runs on a short-lived worker thread using the blocking
//! reqwest client; completions are funneled back through a smol channel.

use crate::{ClientConfig, Completion, Method, NetError, Request, Response, Ticket, Transport};
use crate::request::Body;
use reqwest::blocking::multipart::{Form, Part};
use smol::channel::{Receiver, Sender};

pub struct HttpTransport {
    client: reqwest::blocking::Client,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    outstanding: usize,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, NetError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| NetError::Network(e.to_string()))?;
        let (tx, rx) = smol::channel::unbounded();
        Ok(Self {
            client,
            tx,
            rx,
            outstanding: 0,
        })
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
        Method::Patch => reqwest::Method::PATCH,
    }
}

fn execute(client: &reqwest::blocking::Client, req: Request) -> Result<Response, NetError> {
    let mut builder = client.request(reqwest_method(req.method), &req.url);
    if !req.query.is_empty() {
        builder = builder.query(&req.query);
    }
    for (k, v) in &req.headers {
        builder = builder.header(k, v);
    }
    builder = match req.body {
        Some(Body::Json(value)) => builder.json(&value),
        Some(Body::Multipart { field, filename, bytes }) => {
            builder.multipart(Form::new().part(field, Part::bytes(bytes).file_name(filename)))
        }
        None => builder,
    };

    let response = builder.send().map_err(|e| NetError::Network(e.to_string()))?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
        .collect();
    let body = response.bytes().map_err(|e| NetError::Network(e.to_string()))?.to_vec();
    Ok(Response { status, headers, body })
}

impl Transport for HttpTransport {
    fn dispatch(&mut self, ticket: Ticket, request: Request) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.outstanding += 1;
        std::thread::spawn(move || {
            let result = execute(&client, request);
            if let Err(e) = &result {
                tracing::warn!("request {} failed: {}", ticket, e);
            }
            if tx.send_blocking((ticket, result)).is_err() {
                tracing::debug!("transport dropped before {} completed", ticket);
            }
        });
    }

    fn poll(&mut self) -> Vec<Completion> {
        let mut out = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            out.push(completion);
        }
        self.outstanding = self.outstanding.saturating_sub(out.len());
        out
    }

    fn wait(&mut self) -> Option<Completion> {
        if self.outstanding == 0 {
            return None;
        }
        let completion = smol::block_on(self.rx.recv()).ok()?;
        self.outstanding -= 1;
        Some(completion)
    }
}
