mod support;

mod cast_cycle;
mod illegal_ops;
mod parking;
mod safety;
mod schedule;
