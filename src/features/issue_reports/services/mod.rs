mod image_files;
mod report_service;

pub use report_service::ReportService;
