pub mod yard_builder;
