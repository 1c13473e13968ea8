mod common;
mod generate;
mod mutate;
mod run;
