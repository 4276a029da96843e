pub mod submission_id;

pub use submission_id::{make_span_with_submission_id, submission_id_middleware, SubmissionId};
