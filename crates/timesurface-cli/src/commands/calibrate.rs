//! `timesurface calibrate`: print tick thresholds and the effective load table.

use crate::CommonArgs;

pub fn run(common: &CommonArgs, json: bool) {
    let cal = super::calibrate(common);
    super::print_calibration(&cal);
    println!();

    let table = super::effective_load_table(common, &cal);
    if json {
        match serde_json::to_string_pretty(&table) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error serializing load table: {e}");
                std::process::exit(1);
            }
        }
    } else {
        super::print_load_table(&table);
        if !common.rescale && cal.cpu_freq_hz != table.tuned_for_hz {
            println!();
            println!(
                "Table was tuned for a different clock; pass --rescale to scale repeats to {:.2} GHz.",
                cal.cpu_freq_ghz()
            );
        }
    }
}
