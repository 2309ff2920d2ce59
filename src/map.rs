//! The map renderer seam.
//!
//! A renderer is handed a complete [`MapView`] each time the position
//! changes. The TUI draws it on a canvas; `helpline locate` prints it.

use std::io::{self, Write};

use crate::model::MapView;

/// Draws a region and its markers.
pub trait MapRenderer {
    /// Display `view`, replacing whatever was shown before.
    fn show(&mut self, view: &MapView) -> io::Result<()>;
}

/// Output format for [`TextMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    Json,
}

/// Writes each view to a stream.
pub struct TextMap<W> {
    out: W,
    format: TextFormat,
}

impl<W: Write> TextMap<W> {
    pub fn new(out: W, format: TextFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MapRenderer for TextMap<W> {
    fn show(&mut self, view: &MapView) -> io::Result<()> {
        match self.format {
            TextFormat::Plain => {
                let region = &view.region;
                writeln!(
                    self.out,
                    "Region  {}  (±{:.5}° lat, ±{:.5}° lon)",
                    region.center,
                    region.latitude_delta / 2.0,
                    region.longitude_delta / 2.0
                )?;
                for marker in &view.markers {
                    writeln!(self.out, "Marker  {}  {}", marker.title, marker.coordinate)?;
                }
            }
            TextFormat::Json => {
                serde_json::to_writer_pretty(&mut self.out, view)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{Coordinate, DEFAULT_DELTA};

    fn view() -> MapView {
        MapView::user_location(
            Coordinate::new(37.0, -122.0).unwrap(),
            DEFAULT_DELTA,
            DEFAULT_DELTA,
        )
    }

    #[test]
    fn plain_lists_region_and_marker() {
        let mut map = TextMap::new(Vec::new(), TextFormat::Plain);
        map.show(&view()).unwrap();
        let text = String::from_utf8(map.into_inner()).unwrap();

        assert_eq!(
            text,
            "Region  37.00000°N 122.00000°W  (±0.00500° lat, ±0.00500° lon)\n\
             Marker  You are here  37.00000°N 122.00000°W\n"
        );
    }

    #[test]
    fn json_is_the_view() {
        let mut map = TextMap::new(Vec::new(), TextFormat::Json);
        map.show(&view()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&map.into_inner()).unwrap();

        assert_eq!(json["region"]["center"]["latitude"], 37.0);
        assert_eq!(json["region"]["latitudeDelta"], 0.01);
        assert_eq!(json["markers"][0]["title"], "You are here");
        assert_eq!(json["showsUserLocation"], true);
    }
}
