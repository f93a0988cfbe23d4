//! Rowan language implementation for the Kotlin subset
//!
//! Connects [`SyntaxKind`] to rowan's generic tree types.

use rowan::Language;

use crate::SyntaxKind;

/// Zero-sized marker tying [`SyntaxKind`] to rowan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KotlinLanguage;

impl Language for KotlinLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        // Unknown raw values only come from foreign green trees.
        SyntaxKind::from_raw(raw.0).unwrap_or(SyntaxKind::Error)
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Red tree node
pub type SyntaxNode = rowan::SyntaxNode<KotlinLanguage>;
/// Red tree token
pub type SyntaxToken = rowan::SyntaxToken<KotlinLanguage>;
/// Node or token
pub type SyntaxElement = rowan::SyntaxElement<KotlinLanguage>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        let kinds = [
            SyntaxKind::Whitespace,
            SyntaxKind::FunKw,
            SyntaxKind::Ident,
            SyntaxKind::Colon,
            SyntaxKind::KotlinFile,
            SyntaxKind::CallExpr,
        ];

        for &kind in &kinds {
            let raw = KotlinLanguage::kind_to_raw(kind);
            let back = KotlinLanguage::kind_from_raw(raw);
            assert_eq!(kind, back, "Roundtrip failed for {kind:?}");
        }
    }

    #[test]
    fn test_unknown_raw_is_error() {
        let raw = rowan::SyntaxKind(u16::MAX);
        assert_eq!(KotlinLanguage::kind_from_raw(raw), SyntaxKind::Error);
    }
}
