mod http_notifier;

pub use http_notifier::HttpNotifier;
