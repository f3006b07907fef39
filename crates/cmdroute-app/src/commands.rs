//! Demo commands wired into the dispatcher.

use cmdroute::{ArgValue, Dispatcher, Result};

/// Register every demo command.
pub fn register_demo_commands(d: &mut Dispatcher) -> Result<()> {
    d.register(&["foo"], |a: i32, b: f32, c: f64| {
        println!("foo: {a} {b} {c}");
    });
    d.register(&["bar", "baz", "foo"], |a: i32, b: f32, c: f64| {
        println!("bar baz foo: {}", f64::from(a) + f64::from(b) + c);
    });

    d.register(&["add"], |a: i32, b: i32| println!("{}", a.saturating_add(b)));
    d.set_arg_name(&["add"], 0, "lhs")?;
    d.set_arg_name(&["add"], 1, "rhs")?;
    d.add_positional_flag(&["add"], 1, "--rhs")?;
    d.add_default(&["add"], 1, "1")?;
    d.add_value_flag(&["add"], 1, "--double", ArgValue::typed(2i32))?;
    d.add_alias(&["add"], "plus")?;

    d.register(&["greet"], |name: String, times: i32| {
        for _ in 0..times.max(0) {
            println!("hello, {name}");
        }
    });
    d.set_arg_name(&["greet"], 0, "name")?;
    d.add_default(&["greet"], 1, ArgValue::typed(1i32))?;
    d.add_positional_flag(&["greet"], 1, "-n")?;

    d.register(&["remote", "add"], |name: String, url: String| {
        println!("remote '{name}' -> {url}");
    });
    d.add_alias(&["remote"], "r")?;
    d.set_invalid_command_message(
        Some(&["remote"][..]),
        "usage: remote add <name> <url>",
    )?;
    Ok(())
}
