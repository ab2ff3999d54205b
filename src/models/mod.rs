mod url;

pub use url::{
    short_url, ClickEvent, MappingRecord, MappingRecordView, RegistryStats, DIRECT_REFERRER,
};
