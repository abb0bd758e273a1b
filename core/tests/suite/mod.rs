mod concurrency;
mod persistence;
mod workflow;
