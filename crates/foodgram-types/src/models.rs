use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl Tag {
    /// Accepts `#RRGGBB`. Only the leading seven characters are checked, so
    /// `#FF0000AA` passes as well.
    pub fn is_valid_color(color: &str) -> bool {
        let bytes = color.as_bytes();
        bytes.len() >= 7 && bytes[0] == b'#' && bytes[1..7].iter().all(u8::is_ascii_hexdigit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

/// One aggregated line of a shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert!(Tag::is_valid_color("#E26C2D"));
        assert!(Tag::is_valid_color("#49b64e"));
        assert!(Tag::is_valid_color("#FF0000AA"));
        assert!(!Tag::is_valid_color("E26C2D"));
        assert!(!Tag::is_valid_color("#E26C2"));
        assert!(!Tag::is_valid_color("#G26C2D"));
        assert!(!Tag::is_valid_color(""));
    }
}
