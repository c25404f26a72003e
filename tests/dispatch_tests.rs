#![cfg(feature = "http")]

use cloudpelican::{Config, Event, HttpDispatcher, Transport};
use pretty_assertions::assert_eq;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Accepts one connection, answers `204`, and reports the request line.
fn serve_once(listener: TcpListener) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        loop {
            let mut header = String::new();
            if reader.read_line(&mut header).unwrap() == 0 || header == "\r\n" {
                break;
            }
        }
        let mut stream = reader.into_inner();
        stream
            .write_all(b"HTTP/1.1 204 No Content\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .unwrap();
        tx.send(request_line.trim_end().to_owned()).unwrap();
    });
    rx
}

fn transport(endpoint: &str) -> Transport {
    let config = Config::new("tok")
        .with_compression(false)
        .with_endpoint(endpoint);
    Transport::new(&config, Arc::new(HttpDispatcher::new().unwrap()))
}

fn event(msg: &str) -> Event {
    [("msg", msg), ("host", "example.org")].into_iter().collect()
}

#[test_log::test]
fn test_get_reaches_collector_unchanged() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let requests = serve_once(listener);

    transport(&format!("http://127.0.0.1:{port}/push/")).send(vec![event("hello world")], 1);

    let request_line = requests.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(
        request_line,
        "GET /push/single?js=1&t=tok&f[msg]=hello%20world&f[host]=example.org HTTP/1.1"
    );
}

#[test_log::test]
fn test_refused_connection_is_silent() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let started = Instant::now();
    transport(&format!("http://127.0.0.1:{port}/push/")).send(vec![event("lost")], 1);
    assert!(started.elapsed() < Duration::from_secs(1));

    // Let the dispatch thread hit the refusal; nothing may reach this thread.
    thread::sleep(Duration::from_millis(200));
}
