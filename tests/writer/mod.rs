mod cleanup;
mod failures;
mod modes;
