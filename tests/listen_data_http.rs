use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use wrapped::error::FetchError;
use wrapped::fetch::{HttpApi, RemoteApi};
use wrapped::model::TrackId;

/// Serves one canned HTTP response and returns the request line it saw.
fn serve_once(
    status_line: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let mut response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    );
    for (name, value) in headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str("\r\n");
    response.push_str(body);

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("request line");
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).expect("header") == 0 || line == "\r\n" {
                break;
            }
        }
        stream.write_all(response.as_bytes()).expect("write");
        stream.flush().expect("flush");
        request_line.trim_end().to_string()
    });

    (format!("http://{addr}"), handle)
}

fn api(base: &str) -> HttpApi {
    HttpApi::new(base, Duration::from_secs(3))
}

#[test]
fn fetches_and_decodes_listen_data() {
    let (base, server) = serve_once(
        "200 OK",
        &[("Content-Type", "application/json")],
        r#"[{"id": "x1", "album_art_url": "https://img/x1.jpg", "title": "Skyline", "listen_count": 3, "time_listened": 610}]"#,
    );

    let records = api(&base).listen_data().expect("listen data");

    assert_eq!(server.join().expect("server"), "GET /api/listen-data HTTP/1.1");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, TrackId::from("x1"));
    assert_eq!(records[0].time_listened_seconds, 610);
}

#[test]
fn server_errors_are_fetch_failures() {
    let (base, server) = serve_once("500 Internal Server Error", &[], "oops");

    let err = api(&base).listen_data().expect_err("status error");

    server.join().expect("server");
    assert_eq!(err, FetchError::Status(500));
}

#[test]
fn redirect_to_login_is_not_treated_as_data() {
    let (base, server) = serve_once("302 Found", &[("Location", "/login")], "");

    let err = api(&base).listen_data().expect_err("redirect");

    server.join().expect("server");
    assert_eq!(err, FetchError::Status(302));
}

#[test]
fn malformed_body_is_a_parse_failure() {
    let (base, server) = serve_once("200 OK", &[], "<html>not json</html>");

    let err = api(&base).listen_data().expect_err("parse error");

    server.join().expect("server");
    assert!(err.is_parse());
}

#[test]
fn unreachable_service_is_a_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = api(&format!("http://{addr}")).listen_data().expect_err("refused");

    assert!(matches!(err, FetchError::Network(_)));
}

#[test]
fn login_exposes_identity_provider_redirect() {
    let (base, server) = serve_once(
        "302 Found",
        &[("Location", "https://accounts.spotify.com/authorize?client_id=abc")],
        "",
    );

    let outcome = api(&base).spotify_login().expect("login");

    assert_eq!(server.join().expect("server"), "GET /spotify-login HTTP/1.1");
    assert_eq!(
        outcome.authorize_url.as_deref(),
        Some("https://accounts.spotify.com/authorize?client_id=abc")
    );
}
