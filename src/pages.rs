use roxmltree::{Document, Node};

use crate::config::BUILTIN_PAGES;
use crate::error::CardError;

/// One page of greeting text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub lines: Vec<String>,
    pub footer: Option<String>,
}

/// Ordered, non-empty list of pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBook {
    pages: Vec<Page>,
}

impl PageBook {
    /// Builds a book from pages that already went through validation rules.
    pub fn new(pages: Vec<Page>) -> Result<Self, CardError> {
        if pages.is_empty() {
            return Err(CardError::EmptyBook);
        }
        for (index, page) in pages.iter().enumerate() {
            validate_page(index, page)?;
        }
        Ok(Self { pages })
    }

    /// The page book shipped with the card.
    pub fn builtin() -> Result<Self, CardError> {
        Self::from_xml(BUILTIN_PAGES)
    }

    /// Parses `<card><page><line/>...<footer/></page>...</card>`.
    pub fn from_xml(xml: &str) -> Result<Self, CardError> {
        let document = Document::parse(xml)?;
        let root = document.root_element();
        if !root.has_tag_name("card") {
            return Err(CardError::UnexpectedRoot(
                root.tag_name().name().to_string(),
            ));
        }

        let pages = root
            .children()
            .filter(|node| node.has_tag_name("page"))
            .map(|node| Page {
                lines: node
                    .children()
                    .filter(|child| child.has_tag_name("line"))
                    .map(|child| node_text(&child).unwrap_or_default())
                    .collect(),
                footer: node
                    .children()
                    .find(|child| child.has_tag_name("footer"))
                    .and_then(|child| node_text(&child)),
            })
            .collect();

        Self::new(pages)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Index of the page after `index`, wrapping to the first page.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.pages.len()
    }
}

fn validate_page(index: usize, page: &Page) -> Result<(), CardError> {
    if !(1..=2).contains(&page.lines.len()) {
        return Err(CardError::LineCount {
            page: index,
            count: page.lines.len(),
        });
    }
    if page.lines.iter().any(|line| line.trim().is_empty()) {
        return Err(CardError::EmptyLine { page: index });
    }
    Ok(())
}

fn node_text(node: &Node<'_, '_>) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <card>
        <page>
            <line>Roses</line>
            <line>are red</line>
            <footer>Touch to open</footer>
        </page>
        <page>
            <line>The end</line>
        </page>
    </card>
    "#;

    #[test]
    fn parses_lines_and_optional_footer() {
        let book = PageBook::from_xml(SAMPLE).unwrap();
        assert_eq!(book.len(), 2);
        let first = book.get(0).unwrap();
        assert_eq!(first.lines, vec!["Roses", "are red"]);
        assert_eq!(first.footer.as_deref(), Some("Touch to open"));
        let last = book.get(1).unwrap();
        assert_eq!(last.footer, None);
    }

    #[test]
    fn next_index_wraps() {
        let book = PageBook::from_xml(SAMPLE).unwrap();
        assert_eq!(book.next_index(0), 1);
        assert_eq!(book.next_index(1), 0);
    }

    #[test]
    fn builtin_book_footers_are_content() {
        let book = PageBook::builtin().unwrap();
        assert!(book.len() >= 3);
        assert_eq!(
            book.get(0).unwrap().footer.as_deref(),
            Some("Touch to open")
        );
        assert_eq!(
            book.get(1).unwrap().footer.as_deref(),
            Some("Touch to continue")
        );
        assert_eq!(book.get(book.len() - 1).unwrap().footer, None);
    }

    #[test]
    fn rejects_empty_book() {
        assert!(matches!(
            PageBook::from_xml("<card></card>"),
            Err(CardError::EmptyBook)
        ));
    }

    #[test]
    fn rejects_three_lines() {
        let xml = "<card><page><line>a</line><line>b</line><line>c</line></page></card>";
        assert!(matches!(
            PageBook::from_xml(xml),
            Err(CardError::LineCount { page: 0, count: 3 })
        ));
    }

    #[test]
    fn rejects_blank_line() {
        let xml = "<card><page><line>a</line></page><page><line>  </line></page></card>";
        assert!(matches!(
            PageBook::from_xml(xml),
            Err(CardError::EmptyLine { page: 1 })
        ));
    }

    #[test]
    fn rejects_wrong_root() {
        assert!(matches!(
            PageBook::from_xml("<scene/>"),
            Err(CardError::UnexpectedRoot(name)) if name == "scene"
        ));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(matches!(
            PageBook::from_xml("<card><page>"),
            Err(CardError::PageXml(_))
        ));
    }
}
