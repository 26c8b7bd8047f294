/*!
# Traffic shaper simulations

Command line front end of [`shaper_core`]: runs the models, sweeps one
of their parameters in parallel and writes the results as CSV, next to
the closed-form [`theory`] they can be checked against.

```
use clap::Parser;
use shaper::cli::Cli;

let cli = Cli::try_parse_from(["shaper", "token", "--run-time", "5s"]).unwrap();

let mut csv = Vec::new();
cli.run(&mut csv).unwrap();

let csv = String::from_utf8(csv).unwrap();
assert_eq!(csv.lines().count(), 2);
```
*/

pub mod cli;
pub mod record;
pub mod sweep;
pub mod theory;

pub use shaper_core;
