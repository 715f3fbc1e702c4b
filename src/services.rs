//! # Control Services Module
//!
//! Clients for the vehicle control subsystem's no-argument triggers:
//! enable/disable station keeping and enable/disable thrusters.
//!
//! ## Wire Format
//!
//! Each call opens a TCP connection to the control subsystem, writes one JSON
//! line naming the service, and reads one JSON line back:
//!
//! ```text
//! -> {"service":"/cola2_control/enable_thrusters"}
//! <- {"ok":true}
//! ```
//!
//! ## Availability
//!
//! At startup every service is waited for with a timeout. A service that never
//! shows up is logged and kept anyway; calls to it fail and are logged at call
//! time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::ServicesConfig;
use crate::error::{Result, TeleopError};
use crate::teleop::command::SideEffectRequest;

/// Receiver of mode-change requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ControlSubsystem: Send + Sync {
    /// Deliver one request. Delivery is attempted once.
    async fn request(&self, request: SideEffectRequest) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct ServiceRequest<'a> {
    service: &'a str,
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    ok: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Client for a single remote trigger.
#[derive(Debug, Clone)]
pub struct ServiceProxy {
    name: String,
    addr: SocketAddr,
    call_timeout: Duration,
    retry_interval: Duration,
}

impl ServiceProxy {
    /// Create a proxy for `/{namespace}/{suffix}` served at `addr`.
    ///
    /// # Examples
    ///
    /// ```
    /// use fx10_teleop::services::ServiceProxy;
    /// use std::time::Duration;
    ///
    /// let proxy = ServiceProxy::new(
    ///     "cola2_control",
    ///     "enable_thrusters",
    ///     "127.0.0.1:9100".parse().unwrap(),
    ///     Duration::from_millis(500),
    /// );
    /// assert_eq!(proxy.name(), "/cola2_control/enable_thrusters");
    /// ```
    #[must_use]
    pub fn new(namespace: &str, suffix: &str, addr: SocketAddr, call_timeout: Duration) -> Self {
        Self {
            name: format!("/{}/{}", namespace.trim_matches('/'), suffix),
            addr,
            call_timeout,
            retry_interval: Duration::from_millis(100),
        }
    }

    /// Override the interval between connection attempts in [`wait_for_service`](Self::wait_for_service).
    #[must_use]
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Fully qualified service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Retry connecting until the control subsystem accepts or `wait` elapses.
    ///
    /// # Errors
    ///
    /// Returns `ServiceUnavailable` if no connection succeeded in time.
    pub async fn wait_for_service(&self, wait: Duration) -> Result<()> {
        let deadline = Instant::now() + wait;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match timeout(remaining, TcpStream::connect(self.addr)).await {
                Ok(Ok(_)) => {
                    debug!("Service {} reachable at {}", self.name, self.addr);
                    return Ok(());
                }
                Ok(Err(e)) => debug!("Service {} not reachable yet: {}", self.name, e),
                Err(_) => {}
            }

            if Instant::now() + self.retry_interval >= deadline {
                return Err(TeleopError::ServiceUnavailable {
                    service: self.name.clone(),
                    timeout_ms: wait.as_millis() as u64,
                });
            }
            sleep(self.retry_interval).await;
        }
    }

    /// Invoke the trigger once.
    ///
    /// # Errors
    ///
    /// Returns `ServiceCall` on connection failure, I/O failure, timeout, or a
    /// response with `ok: false`.
    pub async fn call(&self) -> Result<()> {
        match timeout(self.call_timeout, self.exchange()).await {
            Ok(Ok(response)) if response.ok => Ok(()),
            Ok(Ok(response)) => Err(self.call_error(
                response
                    .message
                    .unwrap_or_else(|| "service reported failure".to_string()),
            )),
            Ok(Err(e)) => Err(self.call_error(e.to_string())),
            Err(_) => Err(self.call_error(format!(
                "no response within {} ms",
                self.call_timeout.as_millis()
            ))),
        }
    }

    async fn exchange(&self) -> std::io::Result<ServiceResponse> {
        let mut stream = TcpStream::connect(self.addr).await?;

        let mut line = serde_json::to_vec(&ServiceRequest { service: &self.name })?;
        line.push(b'\n');
        stream.write_all(&line).await?;
        stream.flush().await?;

        let mut reader = BufReader::new(stream);
        let mut response = String::new();
        if reader.read_line(&mut response).await? == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before response",
            ));
        }
        Ok(serde_json::from_str(response.trim_end())?)
    }

    fn call_error(&self, reason: String) -> TeleopError {
        TeleopError::ServiceCall {
            service: self.name.clone(),
            reason,
        }
    }
}

/// The four control-subsystem triggers used by the teleop node.
#[derive(Debug, Clone)]
pub struct ControlServices {
    enable_keep_position: ServiceProxy,
    disable_keep_position: ServiceProxy,
    enable_thrusters: ServiceProxy,
    disable_thrusters: ServiceProxy,
}

impl ControlServices {
    /// Build proxies without waiting for them.
    #[must_use]
    pub fn new(config: &ServicesConfig, addr: SocketAddr) -> Self {
        let call_timeout = Duration::from_millis(config.call_timeout_ms);
        let retry_interval = Duration::from_millis(config.retry_interval_ms);
        let proxy = |request: SideEffectRequest| {
            ServiceProxy::new(&config.namespace, request.service_suffix(), addr, call_timeout)
                .with_retry_interval(retry_interval)
        };

        Self {
            enable_keep_position: proxy(SideEffectRequest::EnableStationKeeping),
            disable_keep_position: proxy(SideEffectRequest::DisableStationKeeping),
            enable_thrusters: proxy(SideEffectRequest::EnableThrusters),
            disable_thrusters: proxy(SideEffectRequest::DisableThrusters),
        }
    }

    /// Build proxies and wait for each service.
    ///
    /// Unavailable services are logged and kept, so startup always succeeds.
    pub async fn connect(node_name: &str, config: &ServicesConfig, addr: SocketAddr) -> Self {
        let services = Self::new(config, addr);
        let wait = Duration::from_millis(config.wait_timeout_ms);

        for request in SideEffectRequest::ALL {
            let proxy = services.proxy(request);
            match proxy.wait_for_service(wait).await {
                Ok(()) => info!("{}: connected to service {}", node_name, proxy.name()),
                Err(e) => warn!("{}: service {} unavailable: {}", node_name, proxy.name(), e),
            }
        }

        services
    }

    /// Proxy serving `request`.
    pub fn proxy(&self, request: SideEffectRequest) -> &ServiceProxy {
        match request {
            SideEffectRequest::EnableStationKeeping => &self.enable_keep_position,
            SideEffectRequest::DisableStationKeeping => &self.disable_keep_position,
            SideEffectRequest::EnableThrusters => &self.enable_thrusters,
            SideEffectRequest::DisableThrusters => &self.disable_thrusters,
        }
    }
}

#[async_trait]
impl ControlSubsystem for ControlServices {
    async fn request(&self, request: SideEffectRequest) -> Result<()> {
        self.proxy(request).call().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Serve `count` connections, answering each with `reply`. Returns the
    /// request lines received.
    async fn serve(
        count: usize,
        reply: &'static str,
    ) -> (SocketAddr, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut received = Vec::new();
            for _ in 0..count {
                let (stream, _) = listener.accept().await.unwrap();
                let mut reader = BufReader::new(stream);
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                received.push(line.trim_end().to_string());
                reader.get_mut().write_all(reply.as_bytes()).await.unwrap();
            }
            received
        });

        (addr, handle)
    }

    fn unused_addr() -> SocketAddr {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    }

    fn test_config() -> ServicesConfig {
        ServicesConfig {
            address: "127.0.0.1:0".to_string(),
            namespace: "cola2_control".to_string(),
            wait_timeout_ms: 200,
            call_timeout_ms: 500,
            retry_interval_ms: 20,
        }
    }

    #[test]
    fn test_qualified_name() {
        let proxy = ServiceProxy::new(
            "/cola2_control/",
            "disable_thrusters",
            unused_addr(),
            Duration::from_millis(100),
        );
        assert_eq!(proxy.name(), "/cola2_control/disable_thrusters");
    }

    #[tokio::test]
    async fn test_call_success() {
        let (addr, server) = serve(1, "{\"ok\":true}\n").await;
        let proxy = ServiceProxy::new("cola2_control", "enable_thrusters", addr, Duration::from_secs(1));

        proxy.call().await.unwrap();

        let received = server.await.unwrap();
        assert_eq!(received, vec!["{\"service\":\"/cola2_control/enable_thrusters\"}"]);
    }

    #[tokio::test]
    async fn test_call_reports_failure_response() {
        let (addr, _server) = serve(1, "{\"ok\":false,\"message\":\"thrusters locked\"}\n").await;
        let proxy = ServiceProxy::new("cola2_control", "enable_thrusters", addr, Duration::from_secs(1));

        match proxy.call().await {
            Err(TeleopError::ServiceCall { service, reason }) => {
                assert_eq!(service, "/cola2_control/enable_thrusters");
                assert_eq!(reason, "thrusters locked");
            }
            other => panic!("Expected ServiceCall error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_call_connection_refused() {
        let proxy = ServiceProxy::new(
            "cola2_control",
            "disable_keep_position",
            unused_addr(),
            Duration::from_secs(1),
        );

        assert!(matches!(
            proxy.call().await,
            Err(TeleopError::ServiceCall { .. })
        ));
    }

    #[tokio::test]
    async fn test_wait_for_service_times_out() {
        let proxy = ServiceProxy::new(
            "cola2_control",
            "enable_thrusters",
            unused_addr(),
            Duration::from_secs(1),
        )
        .with_retry_interval(Duration::from_millis(10));

        match proxy.wait_for_service(Duration::from_millis(100)).await {
            Err(TeleopError::ServiceUnavailable { service, timeout_ms }) => {
                assert_eq!(service, "/cola2_control/enable_thrusters");
                assert_eq!(timeout_ms, 100);
            }
            other => panic!("Expected ServiceUnavailable, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wait_for_service_succeeds() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let proxy = ServiceProxy::new("cola2_control", "enable_thrusters", addr, Duration::from_secs(1));

        tokio_test::assert_ok!(proxy.wait_for_service(Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_control_services_route_requests() {
        let (addr, server) = serve(2, "{\"ok\":true}\n").await;
        let services = ControlServices::new(&test_config(), addr);

        services
            .request(SideEffectRequest::EnableStationKeeping)
            .await
            .unwrap();
        services
            .request(SideEffectRequest::DisableThrusters)
            .await
            .unwrap();

        let received = server.await.unwrap();
        assert_eq!(
            received,
            vec![
                "{\"service\":\"/cola2_control/enable_keep_position_3dof\"}",
                "{\"service\":\"/cola2_control/disable_thrusters\"}",
            ]
        );
    }

    #[tokio::test]
    async fn test_connect_proceeds_when_unavailable() {
        let services = ControlServices::connect("test_node", &test_config(), unused_addr()).await;

        assert_eq!(
            services.proxy(SideEffectRequest::EnableThrusters).name(),
            "/cola2_control/enable_thrusters"
        );
        assert!(services
            .request(SideEffectRequest::EnableThrusters)
            .await
            .is_err());
    }
}
