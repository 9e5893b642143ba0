pub mod task_parser;
pub mod task_serializer;

pub use task_parser::{join_lines, normalize_line_endings, parse_tasks, split_lines};
pub use task_serializer::serialize_tasks;
