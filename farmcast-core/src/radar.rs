//! Embedded precipitation radar.
//!
//! The radar is a third-party map page; all we do is build its URL.

const EMBED_BASE: &str = "https://embed.windy.com/embed2.html";
const DEFAULT_ZOOM: u8 = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct RadarEmbed {
    url: String,
}

impl RadarEmbed {
    /// Without coordinates the map opens on the provider's default view.
    pub fn new(coordinates: Option<(f64, f64)>) -> Self {
        let url = match coordinates {
            Some((lat, lon)) => format!(
                "{EMBED_BASE}?lat={lat:.3}&lon={lon:.3}&zoom={DEFAULT_ZOOM}&overlay=radar&level=surface"
            ),
            None => format!("{EMBED_BASE}?zoom={DEFAULT_ZOOM}&overlay=radar&level=surface"),
        };
        Self { url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn iframe_html(&self, width: u32, height: u32) -> String {
        format!(
            r#"<iframe src="{}" width="{width}" height="{height}" frameborder="0" title="Weather radar"></iframe>"#,
            self.url.replace('&', "&amp;")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_url_without_coordinates() {
        let radar = RadarEmbed::new(None);
        assert!(radar.url().starts_with(EMBED_BASE));
        assert!(!radar.url().contains("lat="));
        assert!(radar.url().contains("overlay=radar"));
    }

    #[test]
    fn coordinates_become_query_parameters() {
        let radar = RadarEmbed::new(Some((23.0226, 72.5714)));
        assert!(radar.url().contains("lat=23.023"));
        assert!(radar.url().contains("lon=72.571"));
    }

    #[test]
    fn iframe_escapes_ampersands() {
        let html = RadarEmbed::new(None).iframe_html(800, 450);
        assert!(html.starts_with("<iframe src=\""));
        assert!(html.contains("&amp;overlay=radar"));
        assert!(html.contains("width=\"800\""));
    }
}
