// Shared fakes
mod support;



mod progress;
mod record;
