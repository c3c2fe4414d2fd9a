//! 集成测试共用工具

#![allow(dead_code)]

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// 可在测试中读取内容的共享缓冲区，用作控制台sink
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// 测试用TCP端点的行为
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// 前 n 个连接接受后立即关闭，之后返回 200
    FailFirst(usize),
    /// 接受连接但从不响应
    Hang,
}

/// 一个统计连接数的本地TCP端点
pub struct TestEndpoint {
    pub url: String,
    connections: Arc<AtomicUsize>,
}

impl TestEndpoint {
    pub async fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = connections.clone();

        tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let seen = counter.fetch_add(1, Ordering::SeqCst);

                match behavior {
                    Behavior::FailFirst(n) if seen < n => drop(stream),
                    Behavior::FailFirst(_) => {
                        tokio::spawn(respond_ok(stream));
                    }
                    Behavior::Hang => held.push(stream),
                }
            }
        });

        Self {
            url: format!("http://{addr}/health"),
            connections,
        }
    }

    /// 已接受的连接数，即探测器发起的尝试次数
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

async fn respond_ok(mut stream: TcpStream) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let _ = stream
        .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
        .await;
    let _ = stream.shutdown().await;
}
