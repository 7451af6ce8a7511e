use std::error::Error;

use mipsgen::{BinaryOperation, Compilation, Options, SemanticResult};

const TEST_PROGRAM: &str = r#"
{
	int x;
	int i;
	int arr[5];
	x = 5;
	i = 2;
	arr[i] = x * 3;
	if (arr[i] > 10) {
		cout << "big";
	} else {
		cout << arr[2];
	}
	while (i > 0) {
		i = i - 1;
	}
	cout << x << endl;
}
"#;

/// The actions a parser would fire for `TEST_PROGRAM`, in source order.
fn replay(cg: &mut Compilation) -> SemanticResult<()> {
	cg.enter_scope()?;
	cg.declare_variable("int", "x")?;
	cg.declare_variable("int", "i")?;
	cg.declare_variable("int", "arr[5]")?;

	let x = cg.resolve_identifier("x")?;
	let five = cg.int_literal(5)?;
	cg.assign(&x, &five)?;
	let i = cg.resolve_identifier("i")?;
	let two = cg.int_literal(2)?;
	cg.assign(&i, &two)?;

	let element = cg.resolve_identifier("arr[i]")?;
	let x = cg.resolve_identifier("x")?;
	let three = cg.int_literal(3)?;
	let product = cg.evaluate_binary(&x, &three, BinaryOperation::Mul)?;
	cg.assign(&element, &product)?;

	let element = cg.resolve_identifier("arr[i]")?;
	let ten = cg.int_literal(10)?;
	let condition = cg.evaluate_binary(&element, &ten, BinaryOperation::Greater)?;
	let else_label = cg.branch_if_zero(&condition)?;
	cg.enter_scope()?;
	let big = cg.string_literal("big")?;
	cg.emit_write(&big)?;
	cg.leave_scope()?;
	let end = cg.branch_then_label(&else_label)?;
	cg.enter_scope()?;
	let fixed = cg.resolve_identifier("arr[2]")?;
	cg.emit_write(&fixed)?;
	cg.leave_scope()?;
	cg.define_label(Some(end.as_str()))?;

	let start = cg.define_label(None)?;
	let i = cg.resolve_identifier("i")?;
	let zero = cg.int_literal(0)?;
	let condition = cg.evaluate_binary(&i, &zero, BinaryOperation::Greater)?;
	let exit = cg.branch_if_zero(&condition)?;
	cg.enter_scope()?;
	let target = cg.resolve_identifier("i")?;
	let i = cg.resolve_identifier("i")?;
	let one = cg.int_literal(1)?;
	let decremented = cg.evaluate_binary(&i, &one, BinaryOperation::Sub)?;
	cg.assign(&target, &decremented)?;
	cg.leave_scope()?;
	cg.branch_and_label(&start, &exit)?;

	let x = cg.resolve_identifier("x")?;
	cg.emit_write(&x)?;
	cg.emit_newline()?;
	log::debug!("symbols before leaving the program block:\n{}", cg.symbols());
	cg.leave_scope()
}

fn main() -> Result<(), Box<dyn Error>> {
	env_logger::init();
	log::info!("compiling:{TEST_PROGRAM}");
	let mut cg = Compilation::new(Options::from_log_level());
	let result = replay(&mut cg);
	log::info!("frame size: {} bytes", cg.frame().size_bytes());
	let asm = cg.finish();
	match std::env::args().nth(1) {
		Some(path) => std::fs::write(&path, asm)?,
		None => print!("{asm}"),
	}
	Ok(result?)
}
