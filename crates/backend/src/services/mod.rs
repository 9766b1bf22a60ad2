pub mod analysis;
pub mod mailer;
pub mod report_sink;
