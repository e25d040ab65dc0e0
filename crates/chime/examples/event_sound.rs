//! Play one event sound through the default driver.
//!
//! Usage: event_sound [EVENT_ID] [KEY VALUE]...
//!
//! Extra arguments are forwarded as attribute pairs, e.g.:
//! `event_sound phone-incoming-call canberra.volume -6.0`

use chime::{attr, Attributes, Context};
use tracing_subscriber::EnvFilter;

fn main() -> chime::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let event = args.next().unwrap_or_else(|| "bell".to_string());

    let mut attrs = Attributes::from_flat(args)?;
    attrs.set(attr::EVENT_ID, event.as_str());
    attrs.set(attr::EVENT_DESCRIPTION, "chime example sound");

    let mut ctx = Context::builder().app_name("chime-example").create()?;
    ctx.play_full(attrs, None).finish()
}
