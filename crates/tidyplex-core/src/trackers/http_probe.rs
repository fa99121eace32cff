use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use super::ProbeError;

/// GET against the announce URL. Only a 200 passes; anything else a
/// tracker answers with (or fails with) disqualifies it.
pub fn probe(client: &Client, url: &Url) -> Result<Duration, ProbeError> {
    let started = Instant::now();
    let response = client.get(url.clone()).send().map_err(|err| {
        if err.is_timeout() {
            ProbeError::TimedOut
        } else {
            ProbeError::Unreachable(err.to_string())
        }
    })?;
    let latency = started.elapsed();

    let status = response.status();
    debug!("{} answered {} in {:?}", url, status, latency);
    if status != StatusCode::OK {
        return Err(ProbeError::BadResponse(format!("status {status}")));
    }
    Ok(latency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn spawn_http_server(status_line: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok"
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        Url::parse(&format!("http://{addr}/announce")).unwrap()
    }

    fn test_client() -> Client {
        Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap()
    }

    #[test]
    fn test_200_passes() {
        let url = spawn_http_server("200 OK");
        assert!(probe(&test_client(), &url).is_ok());
    }

    #[test]
    fn test_404_is_bad_response() {
        let url = spawn_http_server("404 Not Found");
        let result = probe(&test_client(), &url);
        assert!(matches!(result, Err(ProbeError::BadResponse(_))));
    }

    #[test]
    fn test_refused_connection_is_unreachable() {
        // bind then drop to get a port nothing listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("http://127.0.0.1:{port}/announce")).unwrap();
        let result = probe(&test_client(), &url);
        assert!(matches!(result, Err(ProbeError::Unreachable(_))));
    }
}
