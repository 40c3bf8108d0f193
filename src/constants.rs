pub const RECIPE_NAME_MAX_LENGTH: usize = 200;
pub const TAG_NAME_MAX_LENGTH: usize = 200;
pub const USERNAME_MAX_LENGTH: usize = 150;

pub const DEFAULT_SESSION_LIFETIME_HOURS: i64 = 24;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const SESSION_COOKIE: &str = "session";

pub const DEFAULT_INGREDIENTS_PATH: &str = "data/ingredients.csv";
pub const DEFAULT_DOCUMENT_FONT_PATH: &str = "data/fonts/DejaVuSerif.ttf";

// Shopping list document layout
pub const SHOPPING_LIST_TITLE: &str = "Список покупок:";
pub const SHOPPING_LIST_TITLE_FONT_SIZE: u8 = 15;
pub const SHOPPING_LIST_FONT_SIZE: u8 = 12;
pub const PAGE_HEADING_LEFT: u32 = 230;
pub const PAGE_HEADING_TOP: u32 = 780;
pub const PAGE_LEFT: u32 = 50;
pub const PAGE_TOP: u32 = 730;
pub const PAGE_BOTTOM: u32 = 40;
pub const LINE_SPACING: u32 = 25;

pub const MEASUREMENT_UNITS: &[&str] = &[
    "г",
    "кг",
    "шт.",
    "ч. л.",
    "ст. л.",
    "мл",
    "л",
    "стакан",
    "долька",
    "веточка",
    "горсть",
    "пучок",
    "щепотка",
    "по вкусу",
    "кусок",
    "банка",
    "упаковка",
    "батон",
    "капля",
    "бутылка",
    "зубчик",
];
