//! Print-to-PDF stage and output checks.

use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::browser::EngineSession;
use crate::config::Limits;
use crate::options::PdfParams;
use crate::{PressError, Result};

pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Emulates screen media, prints, and checks the buffer.
pub async fn print(
    session: &mut dyn EngineSession,
    params: &PdfParams,
    limits: &Limits,
    budget: Duration,
) -> Result<Vec<u8>> {
    let run = async {
        session.emulate_screen_media().await?;
        debug!(
            paper_width = params.paper_width,
            paper_height = params.paper_height,
            scale = params.scale,
            "printing pdf"
        );
        session.print_pdf(params).await
    };
    let bytes = timeout(budget, run)
        .await
        .map_err(|_| PressError::timeout("pdf generation", budget))??;

    check_pdf(&bytes, limits.max_pdf_bytes)?;
    info!(bytes = bytes.len(), "pdf generated");
    Ok(bytes)
}

/// Oversized output is rejected whole, never truncated.
pub fn check_pdf(bytes: &[u8], max_pdf_bytes: usize) -> Result<()> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(PressError::engine_fault(format!(
            "print produced {} bytes without a %PDF- header",
            bytes.len()
        )));
    }
    if bytes.len() > max_pdf_bytes {
        return Err(PressError::ResultTooLarge {
            size: bytes.len(),
            limit: max_pdf_bytes,
        });
    }
    Ok(())
}
