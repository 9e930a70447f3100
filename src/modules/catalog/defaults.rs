//! Bundled reference data: DDC categories and the factory book list.

use super::models::{Book, DdcCategory, DdcCode, AVAILABLE_STATUS};

/// Version of the bundled book list. Bump when new defaults ship so existing
/// caches pick them up on next load.
pub const DATA_VERSION: &str = "1.0.2";

pub const DDC_CATEGORIES: [DdcCategory; 10] = [
    DdcCategory {
        code: DdcCode::GeneralWorks,
        label: "အထွေထွေဗဟုသုတ",
        icon_key: "book",
        color: "#4A90E2",
    },
    DdcCategory {
        code: DdcCode::Philosophy,
        label: "စိတ်ပညာနှင့် ဒဿန",
        icon_key: "brain",
        color: "#9B59B6",
    },
    DdcCategory {
        code: DdcCode::Religion,
        label: "ဘာသာရေး",
        icon_key: "sun",
        color: "#F1C40F",
    },
    DdcCategory {
        code: DdcCode::SocialSciences,
        label: "လူမှုရေးသိပ္ပံ",
        icon_key: "users",
        color: "#E67E22",
    },
    DdcCategory {
        code: DdcCode::Language,
        label: "ဘာသာစကား",
        icon_key: "message-square",
        color: "#1ABC9C",
    },
    DdcCategory {
        code: DdcCode::Science,
        label: "သဘာဝသိပ္ပံ",
        icon_key: "microscope",
        color: "#2ECC71",
    },
    DdcCategory {
        code: DdcCode::Technology,
        label: "နည်းပညာ",
        icon_key: "settings",
        color: "#34495E",
    },
    DdcCategory {
        code: DdcCode::Arts,
        label: "အနုပညာ",
        icon_key: "palette",
        color: "#E74C3C",
    },
    DdcCategory {
        code: DdcCode::Literature,
        label: "စာပေ",
        icon_key: "pen-tool",
        color: "#DB8C29",
    },
    DdcCategory {
        code: DdcCode::HistoryGeography,
        label: "သမိုင်းနှင့် ပထဝီ",
        icon_key: "map",
        color: "#7F8C8D",
    },
];

/// Reference entry for `code`; the table is indexed in declaration order.
pub fn category(code: DdcCode) -> &'static DdcCategory {
    &DDC_CATEGORIES[code as usize]
}

const DEFAULT_COVER: &str = "/covers/default_cover.jpg";

// (id, title, author, ddc, featured, year, pdf)
const BUNDLED: [(i64, &str, &str, DdcCode, bool, &str, &str); 8] = [
    (1, "API Book", "Ei Maung", DdcCode::GeneralWorks, true, "၂၀၂၃", "/books/API-book-by-Ei-Maung.pdf"),
    (2, "Bitcoin Book", "Ei Maung", DdcCode::SocialSciences, false, "၂၀၂၃", "/books/Bitcoin-book-by-Ei-Maung.pdf"),
    (3, "Bootstrap 5 Book", "Ei Maung", DdcCode::Technology, true, "၂၀၂၃", "/books/Bootstrap5-book-by-Ei-Maung.pdf"),
    (4, "JavaScript Book", "Ei Maung", DdcCode::Technology, true, "၂၀၂၃", "/books/JavaScript-Book-by-Ei-Maung.pdf"),
    (5, "Laravel 8 Book", "Ei Maung", DdcCode::Technology, false, "၂၀၂၃", "/books/Laravel8-book-by-Ei-Maung.pdf"),
    (6, "Professional Web Developer", "Ei Maung", DdcCode::Technology, true, "၂၀၂၃", "/books/Professional-Web-Developer-2023.pdf"),
    (7, "React Book", "Ei Maung", DdcCode::Technology, true, "၂၀၂၃", "/books/React-book-by-Ei-Maung.pdf"),
    (8, "Lyra and Silent Frequency", "Unknown", DdcCode::Literature, false, "2023", "/books/Lyra-and-Silent-Frequency.pdf"),
];

/// A fresh copy of the factory book list.
pub fn default_books() -> Vec<Book> {
    BUNDLED
        .iter()
        .map(|&(id, title, author, ddc, is_featured, year, pdf_url)| Book {
            id,
            title: title.to_string(),
            author: author.to_string(),
            ddc,
            is_featured,
            status: AVAILABLE_STATUS.to_string(),
            year: year.to_string(),
            cover_url: DEFAULT_COVER.to_string(),
            pdf_url: pdf_url.to_string(),
        })
        .collect()
}
