mod cancellation_test;
mod pipeline_test;
