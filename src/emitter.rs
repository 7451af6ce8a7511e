//! MIPS instruction emitter
//!
//! Collects the program body line by line in emission order along with the
//! static strings, and renders the final file with the fixed prolog and
//! postlog around them.

pub const SYSCALL_PRINT_INT: u32 = 1;
pub const SYSCALL_PRINT_STRING: u32 = 4;
pub const SYSCALL_READ_INT: u32 = 5;
pub const SYSCALL_EXIT: u32 = 10;
pub const SYSCALL_PRINT_CHAR: u32 = 11;
pub const SYSCALL_READ_CHAR: u32 = 12;

const PROLOG: &str = r"# Prolog:
.text
main:
move $fp $sp
la $a0 ProgStart
li $v0 4
syscall
# End of Prolog

";

const POSTLOG: &str = r#"
# Postlog:
la $a0 ProgEnd
li $v0 4
syscall
li $v0 10
syscall
.data
ProgStart: 	 .asciiz "Program Start\n"
ProgEnd:   	 .asciiz "Program End\n"
"#;

#[derive(Debug, Default)]
pub struct Emitter {
	body: Vec<String>,
	static_strings: Vec<(String, String)>,
	annotate: bool,
}
impl Emitter {
	pub fn new(annotate: bool) -> Self {
		Self {
			annotate,
			..Default::default()
		}
	}
	pub fn emit(&mut self, line: impl Into<String>) {
		let line = line.into();
		log::trace!("emit: {line}");
		self.body.push(line);
	}
	/// Only written when annotations are turned on.
	pub fn comment(&mut self, text: impl AsRef<str>) {
		if self.annotate {
			self.body.push(format!("# {}", text.as_ref()));
		}
	}
	/// Registers `text` for the data segment under `label`, `text` is raw and
	/// gets quoted on output.
	pub fn add_static_string(&mut self, label: impl Into<String>, text: impl Into<String>) {
		self.static_strings.push((label.into(), text.into()));
	}
	pub fn body(&self) -> &[String] {
		&self.body
	}
	pub fn static_strings(&self) -> &[(String, String)] {
		&self.static_strings
	}
	pub fn render(&self) -> String {
		let mut res = PROLOG.to_string();
		res += self
			.body
			.iter()
			.map(|line| format!("{line}\n"))
			.collect::<String>()
			.as_str();
		res += POSTLOG;
		res += self
			.static_strings
			.iter()
			.map(|(label, text)| format!("{label}: \t\t .asciiz \"{}\"\n", escape(text)))
			.collect::<String>()
			.as_str();
		res
	}
}

fn escape(text: &str) -> String {
	text.chars()
		.map(|c| match c {
			'\n' => "\\n".to_string(),
			'\t' => "\\t".to_string(),
			'"' => "\\\"".to_string(),
			'\\' => "\\\\".to_string(),
			c => c.to_string(),
		})
		.collect()
}
