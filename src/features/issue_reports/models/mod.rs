mod issue_report;

pub use issue_report::IssueReport;
