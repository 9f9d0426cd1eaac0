use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;
use crate::provider::StatusTx;

/// Timeout and retry budget applied to every provider request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(120),
            max_retries: 1,
            backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the given attempt, starting at `backoff`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.min(16))
    }

    /// Delay before the next attempt. A server `Retry-After` hint wins over the
    /// computed backoff but never exceeds `request_timeout`.
    #[must_use]
    pub fn retry_delay(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        hint.map_or_else(
            || self.delay_for(attempt),
            |h| h.min(self.request_timeout),
        )
    }
}

/// Parse the `Retry-After` header value as seconds.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    if let Some(val) = response.headers().get("retry-after")
        && let Ok(s) = val.to_str()
        && let Ok(secs) = s.trim().parse::<u64>()
    {
        return Some(Duration::from_secs(secs));
    }
    None
}

/// Map a non-success response to an error, draining the body for the log.
async fn classify(provider_name: &str, response: reqwest::Response) -> LlmError {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return LlmError::RateLimited;
    }
    let body = response.text().await.unwrap_or_default();
    if status.is_server_error() || status == reqwest::StatusCode::REQUEST_TIMEOUT {
        tracing::warn!("{provider_name} API error {status}: {body}");
        LlmError::Transient {
            status: status.as_u16(),
        }
    } else {
        tracing::error!("{provider_name} API error {status}: {body}");
        LlmError::Permanent {
            status: status.as_u16(),
        }
    }
}

/// Send an HTTP request under `policy`, retrying transient failures.
///
/// Each attempt is bounded by `policy.request_timeout`. Rate limiting, 5xx
/// responses, timeouts and connection failures are retried up to
/// `policy.max_retries` times; any other failure is returned immediately.
/// Returns the successful `Response` for further processing by the caller.
///
/// # Errors
///
/// Returns the last classified error once the retry budget is exhausted, or
/// the first non-transient error.
pub(crate) async fn send_with_retry<F, Fut>(
    provider_name: &str,
    policy: &RetryPolicy,
    status_tx: Option<&StatusTx>,
    mut f: F,
) -> Result<reqwest::Response, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        let mut hint = None;
        let err = match tokio::time::timeout(policy.request_timeout, f()).await {
            Err(_) => LlmError::Timeout(policy.request_timeout),
            Ok(Err(e)) if e.is_timeout() => LlmError::Timeout(policy.request_timeout),
            Ok(Err(e)) => LlmError::Http(e),
            Ok(Ok(response)) if response.status().is_success() => return Ok(response),
            Ok(Ok(response)) => {
                hint = retry_after(&response);
                classify(provider_name, response).await
            }
        };

        if !err.is_transient() || attempt >= policy.max_retries {
            return Err(err);
        }

        let delay = policy.retry_delay(attempt, hint);
        let msg = format!(
            "{provider_name} request failed ({err}), retrying in {}ms ({}/{})",
            delay.as_millis(),
            attempt + 1,
            policy.max_retries
        );
        if let Some(tx) = status_tx {
            let _ = tx.send(msg.clone());
        }
        tracing::warn!("{msg}");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            request_timeout: Duration::from_secs(5),
            max_retries,
            backoff: Duration::ZERO,
        }
    }

    #[test]
    fn delay_for_doubles() {
        let p = RetryPolicy {
            backoff: Duration::from_millis(250),
            ..RetryPolicy::default()
        };
        assert_eq!(p.delay_for(0), Duration::from_millis(250));
        assert_eq!(p.delay_for(1), Duration::from_millis(500));
        assert_eq!(p.delay_for(2), Duration::from_secs(1));
    }

    #[test]
    fn retry_after_hint_is_capped_by_request_timeout() {
        let p = RetryPolicy {
            request_timeout: Duration::from_secs(30),
            max_retries: 1,
            backoff: Duration::from_millis(500),
        };
        assert_eq!(p.retry_delay(0, None), Duration::from_millis(500));
        assert_eq!(p.retry_delay(0, Some(Duration::from_secs(2))), Duration::from_secs(2));
        assert_eq!(
            p.retry_delay(0, Some(Duration::from_secs(3600))),
            Duration::from_secs(30)
        );
    }

    /// Spawn a minimal HTTP server that returns a fixed response for each connection.
    /// Returns (port, join_handle).
    async fn spawn_mock_server(responses: Vec<&'static str>) -> (u16, tokio::task::JoinHandle<()>) {
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            for resp in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let (reader, mut writer) = stream.split();
                    let mut buf_reader = BufReader::new(reader);
                    let mut line = String::new();
                    loop {
                        line.clear();
                        buf_reader.read_line(&mut line).await.unwrap_or(0);
                        if line == "\r\n" || line == "\n" || line.is_empty() {
                            break;
                        }
                    }
                    writer.write_all(resp.as_bytes()).await.ok();
                });
            }
        });

        (port, handle)
    }

    async fn get_with_policy(port: u16, policy: RetryPolicy) -> Result<reqwest::Response, LlmError> {
        let client = reqwest::Client::new();
        let url = format!("http://127.0.0.1:{port}/test");
        send_with_retry("test", &policy, None, || {
            let req = client.get(&url).build().unwrap();
            let c = client.clone();
            async move { c.execute(req).await }
        })
        .await
    }

    #[tokio::test]
    async fn success_on_first_attempt() {
        let ok = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok";
        let (port, _handle) = spawn_mock_server(vec![ok]).await;

        let result = get_with_policy(port, fast_policy(1)).await;
        assert!(result.is_ok(), "expected Ok, got: {result:?}");
        assert_eq!(result.unwrap().status(), 200);
    }

    #[tokio::test]
    async fn rate_limit_exhausts_single_retry() {
        let limited = "HTTP/1.1 429 Too Many Requests\r\nRetry-After: 0\r\nContent-Length: 0\r\n\r\n";
        let (port, _handle) = spawn_mock_server(vec![limited, limited]).await;

        let result = get_with_policy(port, fast_policy(1)).await;
        assert!(
            matches!(result, Err(LlmError::RateLimited)),
            "expected RateLimited, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn long_retry_after_does_not_stall() {
        let limited = "HTTP/1.1 429 Too Many Requests\r\nRetry-After: 3600\r\nContent-Length: 0\r\n\r\n";
        let ok = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok";
        let (port, _handle) = spawn_mock_server(vec![limited, ok]).await;

        let policy = RetryPolicy {
            request_timeout: Duration::from_millis(200),
            max_retries: 1,
            backoff: Duration::ZERO,
        };
        let result = tokio::time::timeout(Duration::from_secs(10), get_with_policy(port, policy))
            .await
            .expect("retry slept past the request timeout");
        assert!(result.is_ok(), "expected Ok after one retry, got: {result:?}");
    }

    #[tokio::test]
    async fn server_error_then_success() {
        let unavailable = "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\n\r\n";
        let ok = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok";
        let (port, _handle) = spawn_mock_server(vec![unavailable, ok]).await;

        let result = get_with_policy(port, fast_policy(1)).await;
        assert!(result.is_ok(), "expected Ok after one retry, got: {result:?}");
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let bad = "HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\n\r\n";
        let ok = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok";
        let (port, _handle) = spawn_mock_server(vec![bad, ok]).await;

        let result = get_with_policy(port, fast_policy(3)).await;
        assert!(
            matches!(result, Err(LlmError::Permanent { status: 401 })),
            "expected Permanent(401), got: {result:?}"
        );
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _handle = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let policy = RetryPolicy {
            request_timeout: Duration::from_millis(100),
            max_retries: 1,
            backoff: Duration::ZERO,
        };
        let result = get_with_policy(port, policy).await;
        assert!(
            matches!(result, Err(LlmError::Timeout(_))),
            "expected Timeout, got: {result:?}"
        );
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn delay_never_shrinks(attempt in 0u32..40, base_ms in 0u64..10_000) {
            let p = RetryPolicy {
                backoff: Duration::from_millis(base_ms),
                ..RetryPolicy::default()
            };
            prop_assert!(p.delay_for(attempt + 1) >= p.delay_for(attempt));
        }
    }
}
