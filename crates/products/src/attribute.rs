//! Classification of spec keys by the attribute they name.

/// What a spec key stands for, as far as variant resolution cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Any key containing "color" or "colour" ("Frame Color", "colour_option").
    Color,
    Ram,
    Storage,
    Memory,
    Other,
}

impl AttributeKind {
    /// Position in a canonical stock key: Color, then Ram, then Storage, then
    /// everything else (which keeps its relative order).
    pub fn stock_rank(self) -> u8 {
        match self {
            AttributeKind::Color => 0,
            AttributeKind::Ram => 1,
            AttributeKind::Storage => 2,
            AttributeKind::Memory | AttributeKind::Other => 3,
        }
    }

    /// Keys whose combinations carry a per-variant stock count.
    pub fn is_stock_tracked(self) -> bool {
        !matches!(self, AttributeKind::Other)
    }
}

/// Classify a spec key.
///
/// Color matching is a case-insensitive substring test; the other kinds need
/// the whole (trimmed) key to match case-insensitively.
pub fn classify(key: &str) -> AttributeKind {
    let lower = key.trim().to_lowercase();
    if lower.contains("color") || lower.contains("colour") {
        return AttributeKind::Color;
    }
    match lower.as_str() {
        "ram" => AttributeKind::Ram,
        "storage" => AttributeKind::Storage,
        "memory" => AttributeKind::Memory,
        _ => AttributeKind::Other,
    }
}

pub fn is_color_like(key: &str) -> bool {
    classify(key) == AttributeKind::Color
}

/// Label equality used for spec keys and stock-key types alike: exact, or
/// equal after Unicode lower-casing.
pub fn same_label(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_is_a_case_insensitive_substring_match() {
        for key in ["Color", "COLOR", "Frame Color", "colour_option", "Colour"] {
            assert_eq!(classify(key), AttributeKind::Color, "{key}");
        }
    }

    #[test]
    fn ram_and_storage_need_the_whole_key() {
        assert_eq!(classify("Ram"), AttributeKind::Ram);
        assert_eq!(classify("RAM"), AttributeKind::Ram);
        assert_eq!(classify(" Storage "), AttributeKind::Storage);
        assert_eq!(classify("STORAGE"), AttributeKind::Storage);
        assert_eq!(classify("Memory"), AttributeKind::Memory);
        assert_eq!(classify("Program"), AttributeKind::Other);
        assert_eq!(classify("Storage Type"), AttributeKind::Other);
    }

    #[test]
    fn stock_rank_orders_color_ram_storage() {
        assert!(AttributeKind::Color.stock_rank() < AttributeKind::Ram.stock_rank());
        assert!(AttributeKind::Ram.stock_rank() < AttributeKind::Storage.stock_rank());
        assert!(AttributeKind::Storage.stock_rank() < AttributeKind::Other.stock_rank());
        assert!(!AttributeKind::Other.is_stock_tracked());
        assert!(AttributeKind::Memory.is_stock_tracked());
    }

    #[test]
    fn labels_compare_with_unicode_case_folding() {
        assert!(same_label("RAM", "ram"));
        assert!(same_label("ÉDITION", "édition"));
        assert!(!same_label("Edition", "Édition"));
    }
}
