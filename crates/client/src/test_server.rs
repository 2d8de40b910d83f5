//! Canned HTTP/1.1 server for client tests.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One canned answer.
pub(crate) struct Route {
    /// Matched against the start of the request line, e.g. `GET /v1/account`.
    pub prefix: &'static str,
    /// Lowercase text the request must contain for this route to match.
    pub requires: Option<&'static str>,
    /// `None` holds the connection open without answering.
    pub reply: Option<Reply>,
}

pub(crate) struct Reply {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(&'static str, String)>,
}

impl Route {
    pub(crate) fn json(prefix: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self {
            prefix,
            requires: None,
            reply: Some(Reply {
                status,
                body: body.into(),
                headers: Vec::new(),
            }),
        }
    }

    pub(crate) fn hang(prefix: &'static str) -> Self {
        Self {
            prefix,
            requires: None,
            reply: None,
        }
    }

    pub(crate) fn requiring(mut self, text: &'static str) -> Self {
        self.requires = Some(text);
        self
    }

    pub(crate) fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        if let Some(reply) = self.reply.as_mut() {
            reply.headers.push((name, value.into()));
        }
        self
    }
}

/// Serve `routes` on a random local port and return the base URL. The first
/// matching route answers; unmatched requests get 404.
pub(crate) async fn serve(routes: Vec<Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&head).to_string();
                let mut lower = head.to_lowercase();
                let expected = content_length(&lower);
                while lower.len() < expected {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => lower.push_str(&String::from_utf8_lossy(&buf[..n]).to_lowercase()),
                    }
                }
                let route = routes.iter().find(|route| {
                    head.starts_with(route.prefix)
                        && route.requires.map_or(true, |text| lower.contains(text))
                });

                match route {
                    Some(Route {
                        reply: Some(reply), ..
                    }) => {
                        let extra: String = reply
                            .headers
                            .iter()
                            .map(|(name, value)| format!("{}: {}\r\n", name, value))
                            .collect();
                        let response = format!(
                            "HTTP/1.1 {} OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n{}connection: close\r\n\r\n{}",
                            reply.status,
                            reply.body.len(),
                            extra,
                            reply.body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                    }
                    Some(_) => {
                        tokio::time::sleep(Duration::from_secs(10)).await;
                    }
                    None => {
                        let _ = socket
                            .write_all(
                                b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                            )
                            .await;
                    }
                }
            });
        }
    });

    format!("http://{}", addr)
}

/// Total request length implied by `content-length`, counting the head.
fn content_length(request: &str) -> usize {
    let Some(head_end) = request.find("\r\n\r\n") else {
        return 0;
    };
    let body_len = request[..head_end]
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    head_end + 4 + body_len
}
