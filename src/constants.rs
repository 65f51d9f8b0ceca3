/// Column names of the Shopify product export
pub const SKU_HEADER: &str = "Variant SKU";
pub const TITLE_HEADER: &str = "Title";
pub const PRICE_HEADER: &str = "Variant Price";
pub const COST_HEADER: &str = "Cost per item";
pub const HANDLE_HEADER: &str = "Handle";

/// Headers that must be present for the export to be usable
pub const REQUIRED_HEADERS: [&str; 2] = [SKU_HEADER, PRICE_HEADER];

/// USD -> CAD multiplier used when no stored rate is available
pub const DEFAULT_EXCHANGE_RATE: f64 = 1.35;

/// Percentage distance from market price that flags a listing
pub const DEFAULT_THRESHOLD_PCT: f64 = 5.0;

pub const MS_PER_DAY: i64 = 86_400_000;

pub const DEFAULT_CONFIG_PATH: &str = "price_compare.toml";
pub const DEFAULT_SHOPIFY_EXPORT: &str = "products_export.csv";
pub const DEFAULT_SHOPIFY_API_VERSION: &str = "2024-07";
pub const LOG_DIR: &str = "logs";

/// Rows shown in the "above market" section of the text report
pub const ABOVE_MARKET_REPORT_LIMIT: usize = 10;

// Supabase tables
pub const PRODUCTS_TABLE: &str = "products";
pub const EXCHANGE_RATES_TABLE: &str = "exchange_rates";
pub const PRODUCTS_SELECT: &str =
    "id,sku,usd_price,last_updated,sets(name,release_date),product_types(name,label)";
pub const EXCHANGE_RATE_SELECT: &str = "usd_to_cad,recorded_at";
pub const UNKNOWN_LABEL: &str = "Unknown";
