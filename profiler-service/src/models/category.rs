use serde::Serialize;

/// A skill category as presented on the selection screen.
///
/// `id` is the slug clients send back; `title` is the key used by the
/// question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryMeta {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

/// Every category the service knows how to present, in display order.
pub const CATEGORY_CATALOGUE: &[CategoryMeta] = &[
    CategoryMeta {
        id: "verbal-logic",
        title: "Verbal Logic",
        description: "Reasoning with language and words.",
        icon: "message-circle",
    },
    CategoryMeta {
        id: "pattern-recognition",
        title: "Pattern Recognition",
        description: "Identifying sequences and connections.",
        icon: "grid-3x3",
    },
    CategoryMeta {
        id: "spatial-reasoning",
        title: "Spatial Reasoning",
        description: "Visualizing and manipulating shapes.",
        icon: "box",
    },
    CategoryMeta {
        id: "memory",
        title: "Memory",
        description: "Recalling information accurately.",
        icon: "brain",
    },
    CategoryMeta {
        id: "numerical-reasoning",
        title: "Numerical Reasoning",
        description: "Solving problems with numbers.",
        icon: "calculator",
    },
    CategoryMeta {
        id: "attention-to-detail",
        title: "Attention to Detail",
        description: "Focusing on the small particulars.",
        icon: "search",
    },
];

impl CategoryMeta {
    pub fn by_id(id: &str) -> Option<&'static CategoryMeta> {
        CATEGORY_CATALOGUE.iter().find(|c| c.id == id)
    }

    pub fn by_title(title: &str) -> Option<&'static CategoryMeta> {
        CATEGORY_CATALOGUE.iter().find(|c| c.title == title)
    }
}
