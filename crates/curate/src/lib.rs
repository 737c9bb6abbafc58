pub mod dedup;
pub mod hash;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod score;
pub mod suggest;
pub mod util;

pub use dedup::{DuplicateDetector, DUPLICATE_THRESHOLD, WINDOW_MAX};
pub use hash::{tx_hash, TX_HASH_LEN};
pub use metrics::aggregate;
pub use normalize::{
    normalize, normalize_date, normalize_description, parse_amount, NormalizeError,
};
pub use pipeline::CurationPipeline;
pub use score::composite_score;
pub use suggest::{
    suggest_category, suggest_payee, KeywordEngine, KeywordRule, CATEGORY_CATCH_ALL,
    CATEGORY_UNCLASSIFIED, PAYEE_FALLBACK,
};
