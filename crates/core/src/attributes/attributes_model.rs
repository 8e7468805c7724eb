use tickerinfo_market_data::{
    AssetClass, Attribute, AttributeRecord, OrderedRecord, SourcePreference,
};

/// One attribute lookup, as received at the boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeRequest {
    pub asset_class: AssetClass,
    /// Normalized for the asset class (see [`AssetClass::normalize_id`]).
    pub instrument_id: String,
    /// Trading symbol for crypto slugs.
    pub symbol: Option<String>,
    /// Requested attributes in response order.
    pub attributes: Vec<Attribute>,
    pub source: SourcePreference,
    pub use_cache: bool,
    pub clear_cached_data: bool,
    pub delete_all_cache: bool,
}

impl AttributeRequest {
    pub fn new(asset_class: AssetClass, instrument_id: &str, attributes: Vec<Attribute>) -> Self {
        Self {
            asset_class,
            instrument_id: asset_class.normalize_id(instrument_id),
            symbol: None,
            attributes,
            source: SourcePreference::All,
            use_cache: true,
            clear_cached_data: false,
            delete_all_cache: false,
        }
    }

    pub fn with_source(mut self, source: SourcePreference) -> Self {
        self.source = source;
        self
    }

    pub fn with_symbol(mut self, symbol: Option<String>) -> Self {
        self.symbol = symbol;
        self
    }

    pub fn with_cache_directives(
        mut self,
        use_cache: bool,
        clear_cached_data: bool,
        delete_all_cache: bool,
    ) -> Self {
        self.use_cache = use_cache;
        self.clear_cached_data = clear_cached_data;
        self.delete_all_cache = delete_all_cache;
        self
    }

    /// A request that clears anything never reads or writes the cache.
    pub fn can_use_cache(&self) -> bool {
        self.use_cache && !(self.delete_all_cache || self.clear_cached_data)
    }
}

/// Outcome of the cache-then-engine step, before projection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    /// True when the engine produced something worth writing back.
    pub should_persist: bool,
    pub record: AttributeRecord,
}

/// Final answer to an [`AttributeRequest`].
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeLookup {
    pub asset_class: AssetClass,
    pub instrument_id: String,
    /// Requested attributes present in the result, in request order.
    pub record: OrderedRecord,
    pub persisted: bool,
}
