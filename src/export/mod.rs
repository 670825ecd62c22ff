//! Report export to PDF.
mod font;
pub mod layout;
mod render;

use std::time::Duration;

use image::DynamicImage;
use reqwest::Client;

use crate::config;
use crate::model::ReportData;
use layout::{Branding, Evidence};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("could not fetch evidence: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("could not decode evidence: {0}")]
    Decode(#[from] image::ImageError),
    #[error("report has no reachable image")]
    Unreachable,
    #[error("could not render document: {0}")]
    Render(String),
}

/// Download name of the exported document.
pub fn file_name(report: &ReportData) -> String {
    let id = match report.id() {
        "" => "NUEVO",
        id => id,
    };
    format!("Informe-Guardian-IA-{id}.pdf")
}

async fn fetch(client: &Client, url: &str) -> Result<DynamicImage, ExportError> {
    let bytes = client
        .get(url)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    Ok(image::load_from_memory(&bytes)?)
}

/// Decode the evidence photo, from memory or from its remote URL.
async fn load_evidence(
    client: &Client,
    report: &ReportData,
) -> Option<Result<DynamicImage, ExportError>> {
    if let Some(evidence) = &report.evidence {
        return Some(image::load_from_memory(&evidence.bytes).map_err(Into::into));
    }

    let url = report.image_url.as_str();
    if url.is_empty() {
        None
    } else if url.starts_with("http://") || url.starts_with("https://") {
        Some(fetch(client, url).await)
    } else {
        Some(Err(ExportError::Unreachable))
    }
}

/// Build the PDF of `report`.
///
/// A photo that cannot be loaded is replaced by a notice; it never fails
/// the export.
pub async fn export(
    client: &Client,
    report: &ReportData,
    config: &config::Export,
) -> Result<Vec<u8>, ExportError> {
    let image = match load_evidence(client, report).await {
        Some(Ok(image)) => Some(image),
        Some(Err(err)) => {
            tracing::warn!(report_id = report.id(), error = %err, "evidence not embedded");
            None
        },
        None => None,
    };

    let evidence = match &image {
        Some(image) => Evidence::Loaded {
            width: image.width(),
            height: image.height(),
        },
        None if report.image_url.is_empty() && report.evidence.is_none() => {
            Evidence::None
        },
        None => Evidence::Unavailable,
    };

    let branding = Branding {
        watermark: &config.watermark,
        product: &config.product,
    };
    let plan = layout::compose(report, evidence, branding);
    tracing::debug!(report_id = report.id(), pages = plan.pages.len(), "report laid out");

    render::render(&plan, image.as_ref(), &file_name(report))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use axum::body::Bytes;
    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;
    use crate::model::{EvidenceImage, ImageSource, RiskLevel};

    fn report() -> ReportData {
        ReportData {
            id: Some("rep-1722513600000".into()),
            risk_level: RiskLevel::Amarillo,
            anomaly_description: "Piso resbaladizo.".into(),
            ppe_recommendation: "Calzado antideslizante.".into(),
            infrastructure_suggestion: "Señalización.".into(),
            legal_reference: "Ley 19.587.".into(),
            location: "Pasillo".into(),
            date: "2024-08-01T12:00:00.000Z".into(),
            image_url: String::default(),
            user: crate::fixtures::users().remove(2),
            evidence: None,
        }
    }

    fn png() -> Bytes {
        let image = RgbImage::from_pixel(6, 4, Rgb([200, 30, 30]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        Bytes::from(bytes.into_inner())
    }

    #[test]
    fn test_file_name() {
        let mut report = report();
        assert_eq!(file_name(&report), "Informe-Guardian-IA-rep-1722513600000.pdf");
        report.id = None;
        assert_eq!(file_name(&report), "Informe-Guardian-IA-NUEVO.pdf");
    }

    #[tokio::test]
    async fn test_export_with_inline_evidence() {
        let mut report = report();
        report.image_url = "/reports/rep-1722513600000/image".into();
        report.evidence = Some(EvidenceImage {
            bytes: png(),
            mime_type: "image/png".into(),
            file_name: "pasillo.png".into(),
            source: ImageSource::Upload,
        });

        let pdf = export(&Client::new(), &report, &config::Export::default())
            .await
            .unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_broken_evidence_does_not_fail_export() {
        let mut report = report();
        report.image_url = "/reports/rep-1722513600000/image".into();
        report.evidence = Some(EvidenceImage {
            bytes: Bytes::from_static(b"not an image"),
            mime_type: "image/jpeg".into(),
            file_name: "roto.jpg".into(),
            source: ImageSource::Camera,
        });

        let pdf = export(&Client::new(), &report, &config::Export::default())
            .await
            .unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        assert!(matches!(
            load_evidence(&Client::new(), &report).await,
            Some(Err(ExportError::Decode(_)))
        ));
    }

    #[tokio::test]
    async fn test_relative_url_without_bytes_is_unreachable() {
        let mut report = report();
        report.image_url = "/reports/gone/image".into();

        assert!(matches!(
            load_evidence(&Client::new(), &report).await,
            Some(Err(ExportError::Unreachable))
        ));
        report.image_url = String::default();
        assert!(load_evidence(&Client::new(), &report).await.is_none());
    }
}
