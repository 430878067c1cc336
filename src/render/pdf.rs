// src/render/pdf.rs

use std::path::PathBuf;

use genpdf::{elements, style, Alignment, Element};
use image::Luma;
use qrcode::QrCode;

use super::{DocumentTemplate, Row};
use crate::common::error::AppError;

#[derive(Debug, Clone)]
pub struct PdfRenderer {
    fonts_dir: PathBuf,
    font_family: String,
}

impl PdfRenderer {
    pub fn new(fonts_dir: impl Into<PathBuf>, font_family: impl Into<String>) -> Self {
        Self {
            fonts_dir: fonts_dir.into(),
            font_family: font_family.into(),
        }
    }

    /// Desenha o template numa página A4 e devolve os bytes do PDF.
    pub fn render(&self, template: &DocumentTemplate) -> Result<Vec<u8>, AppError> {
        // Carrega a fonte da pasta configurada
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, &self.font_family, None)
            .map_err(|e| {
                AppError::FontNotFound(format!(
                    "Fonte '{}' não encontrada em {}: {}",
                    self.font_family,
                    self.fonts_dir.display(),
                    e
                ))
            })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(template.title.clone());
        doc.set_paper_size(genpdf::PaperSize::A4);
        doc.set_font_size(8);
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(8);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(
            elements::Paragraph::new(template.title.clone())
                .aligned(Alignment::Center)
                .styled(style::Style::new().bold().with_font_size(14)),
        );
        if !template.subtitle.is_empty() {
            doc.push(
                elements::Paragraph::new(template.subtitle.clone())
                    .aligned(Alignment::Center)
                    .styled(style::Style::new().with_font_size(9)),
            );
        }
        doc.push(elements::Break::new(0.5));

        // --- SEÇÕES ---
        for section in &template.sections {
            doc.push(
                elements::Paragraph::new(section.title.clone())
                    .styled(style::Style::new().bold().with_font_size(7)),
            );
            for row in &section.rows {
                doc.push(row_table(row)?);
            }
            doc.push(elements::Break::new(0.3));
        }

        // --- QR CODE ---
        if let Some(payload) = &template.qr_payload {
            let code = QrCode::new(payload.as_bytes()).map_err(|e| AppError::Pdf(e.to_string()))?;
            let image_buffer = code.render::<Luma<u8>>().build();
            let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

            let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
                .map_err(|e| AppError::Pdf(e.to_string()))?
                .with_alignment(Alignment::Right)
                .with_scale(genpdf::Scale::new(0.4, 0.4));
            doc.push(pdf_image);
        }

        // --- RODAPÉ ---
        if !template.footer.is_empty() {
            doc.push(elements::Break::new(0.5));
            doc.push(
                elements::Paragraph::new(template.footer.clone())
                    .styled(style::Style::new().italic().with_font_size(6)),
            );
        }

        // Renderiza para buffer (memória)
        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(|e| AppError::Pdf(e.to_string()))?;

        Ok(buffer)
    }

    /// `render` fora do runtime assíncrono.
    pub async fn render_blocking(&self, template: DocumentTemplate) -> Result<Vec<u8>, AppError> {
        let renderer = self.clone();
        tokio::task::spawn_blocking(move || renderer.render(&template))
            .await
            .map_err(|e| AppError::Pdf(e.to_string()))?
    }
}

/// Cada linha vira uma tabela de uma linha só, com os pesos das suas células.
fn row_table(row: &Row) -> Result<elements::TableLayout, AppError> {
    let mut table = elements::TableLayout::new(row.weights());
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let label_style = style::Style::new().with_font_size(6);
    let value_style = if row.header {
        style::Style::new().bold().with_font_size(7)
    } else {
        style::Style::new().with_font_size(8)
    };

    let mut table_row = table.row();
    for cell in &row.cells {
        let mut content = elements::LinearLayout::vertical();
        if !cell.label.is_empty() {
            content.push(elements::Paragraph::new(cell.label.clone()).styled(label_style));
        }
        // Paragraph não quebra em '\n'; o valor já vem cortado em linhas
        for line in cell.value.split('\n') {
            content.push(elements::Paragraph::new(line.to_string()).styled(value_style));
        }
        table_row.push_element(content.padded(1));
    }
    table_row.push().map_err(|e| AppError::Pdf(e.to_string()))?;

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Cell, Section};

    #[test]
    fn missing_fonts_are_reported() {
        let template = DocumentTemplate {
            title: "DANFSe".to_string(),
            sections: vec![Section::new("X").row(vec![Cell::new("A", "1", 1)])],
            ..Default::default()
        };
        let renderer = PdfRenderer::new("/caminho/que/nao/existe", "Roboto");
        assert!(matches!(renderer.render(&template), Err(AppError::FontNotFound(_))));
    }
}
