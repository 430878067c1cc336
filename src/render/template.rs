// src/render/template.rs
//
// Descrição em dados de um documento de uma página. DANFE e DANFSe montam um
// `DocumentTemplate`; o `PdfRenderer` só sabe desenhar templates.

use serde::Serialize;

/// Caracteres que cabem numa linha de largura total da página A4 em fonte 8.
pub const LINE_WIDTH_CHARS: usize = 120;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTemplate {
    pub title: String,
    pub subtitle: String,
    pub sections: Vec<Section>,
    pub footer: String,
    /// Conteúdo do QR code (chave de acesso ou código de verificação)
    pub qr_payload: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub cells: Vec<Cell>,
    /// Linha de cabeçalho de tabela (negrito, sem rótulos)
    pub header: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub label: String,
    pub value: String,
    /// Peso relativo da coluna dentro da linha
    pub weight: usize,
    pub max_lines: Option<usize>,
}

impl Cell {
    pub fn new(label: impl Into<String>, value: impl Into<String>, weight: usize) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            weight: weight.max(1),
            max_lines: None,
        }
    }

    /// Célula sem rótulo, usada nas linhas de tabela.
    pub fn plain(value: impl Into<String>, weight: usize) -> Self {
        Self::new("", value, weight)
    }

    /// Corta o valor em `max_lines` linhas de `chars_per_line` caracteres.
    pub fn clipped(mut self, max_lines: usize, chars_per_line: usize) -> Self {
        self.value = clip_lines(&self.value, max_lines, chars_per_line);
        self.max_lines = Some(max_lines);
        self
    }
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells, header: false }
    }

    pub fn header(titles: &[(&str, usize)]) -> Self {
        Self {
            cells: titles.iter().map(|(t, w)| Cell::plain(*t, *w)).collect(),
            header: true,
        }
    }

    pub fn weights(&self) -> Vec<usize> {
        self.cells.iter().map(|c| c.weight).collect()
    }
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), rows: Vec::new() }
    }

    pub fn row(mut self, cells: Vec<Cell>) -> Self {
        self.rows.push(Row::new(cells));
        self
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Procura uma célula pelo rótulo em qualquer linha.
    pub fn cell(&self, label: &str) -> Option<&Cell> {
        self.rows
            .iter()
            .flat_map(|r| r.cells.iter())
            .find(|c| c.label == label)
    }
}

impl DocumentTemplate {
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }
}

/// Quebra `text` em linhas de até `chars_per_line` caracteres (por palavra) e
/// mantém só as `max_lines` primeiras. Texto cortado termina em `…`.
pub fn clip_lines(text: &str, max_lines: usize, chars_per_line: usize) -> String {
    if max_lines == 0 || chars_per_line == 0 {
        return String::new();
    }

    let lines: Vec<String> = text
        .lines()
        .flat_map(|line| wrap(line.trim_end(), chars_per_line))
        .collect();

    if lines.len() <= max_lines {
        return lines.join("\n");
    }

    let mut kept: Vec<String> = lines.into_iter().take(max_lines).collect();
    if let Some(last) = kept.last_mut() {
        let mut truncated: String = last.chars().take(chars_per_line.saturating_sub(1)).collect();
        truncated.push('…');
        *last = truncated;
    }
    kept.join("\n")
}

fn wrap(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        // palavra maior que a linha é quebrada à força
        while word.len() > width {
            if current_len > 0 {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            out.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > width && current_len > 0 {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current_len += word.len();
        current.extend(word);
    }

    if current_len > 0 {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(clip_lines("Consultoria", 3, 20), "Consultoria");
        assert_eq!(clip_lines("a\nb", 3, 20), "a\nb");
    }

    #[test]
    fn wraps_by_word_and_clips() {
        let text = "um dois tres quatro cinco seis sete oito";
        assert_eq!(clip_lines(text, 10, 10), "um dois\ntres\nquatro\ncinco seis\nsete oito");
        assert_eq!(clip_lines(text, 2, 10), "um dois\ntres…");
    }

    #[test]
    fn long_words_are_hard_broken() {
        assert_eq!(clip_lines("abcdefghij", 5, 4), "abcd\nefgh\nij");
        assert_eq!(clip_lines("abcdefghij", 1, 4), "abc…");
    }

    #[test]
    fn never_returns_more_lines_than_allowed() {
        let text = "linha\n".repeat(50);
        assert_eq!(clip_lines(&text, 7, 30).lines().count(), 7);
        assert_eq!(clip_lines(&text, 0, 30), "");
    }

    #[test]
    fn cells_record_clipping() {
        let cell = Cell::new("Descrição", "x ".repeat(100), 1).clipped(2, 10);
        assert_eq!(cell.max_lines, Some(2));
        assert_eq!(cell.value.lines().count(), 2);
        assert!(cell.value.ends_with('…'));
    }
}
