//! Show upcoming scheduled generations.

use chrono::{DateTime, FixedOffset, Local, TimeZone};

use powerchip_storefront::jobs::WEEKLY_TRIGGERS;
use powerchip_storefront::jobs::schedule::upcoming;

/// Print each trigger's next fire time, soonest first.
pub fn print(from: Option<DateTime<FixedOffset>>) {
    match from {
        Some(from) => print_from(&from),
        None => print_from(&Local::now()),
    }
}

fn print_from<Tz: TimeZone>(now: &DateTime<Tz>)
where
    Tz::Offset: std::fmt::Display,
{
    #[allow(clippy::print_stdout)]
    {
        println!("Reference: {}", now.to_rfc3339());
        for (trigger, next) in upcoming(&WEEKLY_TRIGGERS, now) {
            println!(
                "{:<20} {:<28} {}",
                trigger.name,
                next.format("%a %Y-%m-%d %H:%M %:z").to_string(),
                trigger.job
            );
        }
    }
}
