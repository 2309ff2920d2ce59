//! gpsd client: reads a position from a local GPS daemon.
//!
//! Speaks the gpsd JSON protocol over TCP. Each request opens a
//! connection, enables watching, and waits for the first `TPV`
//! report that carries a 2D or 3D fix.

use async_trait::async_trait;
use jiff::Timestamp;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::model::{Coordinate, Fix};

use super::{LocationProvider, PermissionStatus, ProviderError};

/// Default gpsd listening address.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:2947";

const WATCH_COMMAND: &str = "?WATCH={\"enable\":true,\"json\":true};\n";

/// Lowest `mode` value that carries a position (2 = 2D fix, 3 = 3D fix).
const MODE_2D: u8 = 2;

#[derive(Debug, Clone)]
pub struct GpsdProvider {
    address: String,
}

impl GpsdProvider {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl LocationProvider for GpsdProvider {
    async fn request_foreground_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn current_position(&self) -> Result<Fix, ProviderError> {
        tracing::debug!(address = %self.address, "connecting to gpsd");
        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(|e| ProviderError::Unavailable(format!("gpsd at {}: {e}", self.address)))?;

        let (read, mut write) = stream.into_split();
        write.write_all(WATCH_COMMAND.as_bytes()).await?;

        let mut lines = BufReader::new(read).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(fix) = parse_report(&line)? {
                tracing::debug!(coordinate = %fix.coordinate, "gpsd fix");
                return Ok(fix);
            }
        }

        Err(ProviderError::Unavailable(
            "gpsd closed the connection before reporting a fix".to_string(),
        ))
    }
}

/// The subset of a gpsd report we read. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct Report {
    class: String,
    #[serde(default)]
    mode: u8,
    time: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    alt: Option<f64>,
    #[serde(rename = "altMSL")]
    alt_msl: Option<f64>,
    eph: Option<f64>,
    epx: Option<f64>,
    epy: Option<f64>,
}

/// Parse one line from gpsd. Returns `None` for reports without a usable fix.
pub fn parse_report(line: &str) -> Result<Option<Fix>, ProviderError> {
    let report: Report = serde_json::from_str(line)?;

    if report.class != "TPV" || report.mode < MODE_2D {
        return Ok(None);
    }
    let (Some(lat), Some(lon)) = (report.lat, report.lon) else {
        return Ok(None);
    };

    let coordinate =
        Coordinate::new(lat, lon).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    let timestamp = match report.time.as_deref() {
        Some(t) => t
            .parse::<Timestamp>()
            .map_err(|e| ProviderError::Malformed(format!("bad time {t:?}: {e}")))?,
        None => Timestamp::now(),
    };

    let accuracy_m = report.eph.or(match (report.epx, report.epy) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    });

    Ok(Some(Fix {
        coordinate,
        accuracy_m,
        altitude_m: report.alt_msl.or(report.alt),
        timestamp,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;

    const VERSION: &str = r#"{"class":"VERSION","release":"3.25","rev":"3.25","proto_major":3,"proto_minor":15}"#;
    const NO_FIX: &str = r#"{"class":"TPV","device":"/dev/ttyACM0","mode":1}"#;
    const FIX_3D: &str = r#"{"class":"TPV","device":"/dev/ttyACM0","mode":3,"time":"2025-06-08T10:34:48.283Z","lat":37.0,"lon":-122.0,"altMSL":12.5,"eph":4.2}"#;

    #[test]
    fn parses_3d_fix() {
        let fix = parse_report(FIX_3D).unwrap().unwrap();
        assert_eq!(fix.coordinate, Coordinate::new(37.0, -122.0).unwrap());
        assert_eq!(fix.altitude_m, Some(12.5));
        assert_eq!(fix.accuracy_m, Some(4.2));
        assert_eq!(
            fix.timestamp,
            "2025-06-08T10:34:48.283Z".parse::<Timestamp>().unwrap()
        );
    }

    #[test]
    fn skips_reports_without_fix() {
        assert!(parse_report(VERSION).unwrap().is_none());
        assert!(parse_report(NO_FIX).unwrap().is_none());
        assert!(
            parse_report(r#"{"class":"TPV","mode":2,"lat":1.0}"#)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn falls_back_to_epx_epy_for_accuracy() {
        let line = r#"{"class":"TPV","mode":2,"lat":1.0,"lon":2.0,"epx":3.0,"epy":5.0}"#;
        let fix = parse_report(line).unwrap().unwrap();
        assert_eq!(fix.accuracy_m, Some(5.0));
        assert_eq!(fix.altitude_m, None);
    }

    #[test]
    fn rejects_garbage_and_out_of_range() {
        assert!(matches!(
            parse_report("not json"),
            Err(ProviderError::Malformed(_))
        ));
        assert!(matches!(
            parse_report(r#"{"class":"TPV","mode":3,"lat":91.0,"lon":0.0}"#),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn reads_first_fix_from_daemon() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let daemon = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut lines = BufReader::new(read).lines();
            let watch = lines.next_line().await.unwrap().unwrap();
            assert!(watch.starts_with("?WATCH="));
            for line in [VERSION, NO_FIX, FIX_3D] {
                write.write_all(line.as_bytes()).await.unwrap();
                write.write_all(b"\n").await.unwrap();
            }
        });

        let fix = GpsdProvider::new(address)
            .current_position()
            .await
            .unwrap();
        assert_eq!(fix.coordinate, Coordinate::new(37.0, -122.0).unwrap());
        daemon.await.unwrap();
    }

    #[tokio::test]
    async fn closed_stream_without_fix_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(VERSION.as_bytes()).await.unwrap();
            socket.write_all(b"\n").await.unwrap();
        });

        let err = GpsdProvider::new(address)
            .current_position()
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }
}
