//! Operating system module
//!
//! Exposes environment, process, and file access to scripts as the `os`
//! namespace. Every operation consults the session's security grants before
//! touching the host; the namespace itself is built once on first load and
//! cached for the lifetime of the module.

use crate::ctx::Ctx;
use crate::module::Module;
use crate::native::NativeFunc;
use crate::object::Object;
use crate::stdlib::{num_arg, str_arg};
use crate::value::{RuntimeError, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::process::Command;
use std::sync::{Arc, Mutex};

/// The `os` standard-library module.
pub struct OsMod {
    ctx: Option<Arc<Ctx>>,
    ns: Option<Value>,
}

impl OsMod {
    pub fn new() -> Self {
        OsMod { ctx: None, ns: None }
    }
}

impl Default for OsMod {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for OsMod {
    fn id(&self) -> &str {
        "os"
    }

    fn set_ctx(&mut self, ctx: Arc<Ctx>) {
        self.ctx = Some(ctx);
    }

    fn run(&mut self) -> Result<Value, RuntimeError> {
        if let Some(ns) = &self.ns {
            return Ok(ns.clone());
        }
        let ctx = self.ctx.as_ref().ok_or_else(|| RuntimeError::Type {
            msg: "os module loaded before context binding".to_string(),
        })?;
        log::debug!("building os namespace");
        let ns = build_namespace(ctx);
        self.ns = Some(ns.clone());
        Ok(ns)
    }
}

fn build_namespace(ctx: &Arc<Ctx>) -> Value {
    let ns = Object::new();

    ns.set(
        "pathSeparator",
        Value::string(std::path::MAIN_SEPARATOR.to_string()),
    );
    #[cfg(windows)]
    {
        ns.set("pathListSeparator", Value::string(";"));
        ns.set("devNull", Value::string("NUL"));
    }
    #[cfg(not(windows))]
    {
        ns.set("pathListSeparator", Value::string(":"));
        ns.set("devNull", Value::string("/dev/null"));
    }

    let sec = Arc::clone(ctx);
    ns.set(
        "getenv",
        Value::Func(NativeFunc::new(ctx, "os.getenv", move |args| {
            let name = str_arg("os.getenv", args, 0)?;
            sec.security().check_environment(&name)?;
            match std::env::var(&name) {
                Ok(v) => Ok(Value::string(v)),
                Err(_) => Ok(Value::Nil),
            }
        })),
    );

    let sec = Arc::clone(ctx);
    ns.set(
        "getwd",
        Value::Func(NativeFunc::new(ctx, "os.getwd", move |_args| {
            sec.security().check_filesystem_read(".")?;
            let cwd = std::env::current_dir().map_err(RuntimeError::io)?;
            Ok(Value::string(cwd.to_string_lossy().into_owned()))
        })),
    );

    let sec = Arc::clone(ctx);
    ns.set(
        "exec",
        Value::Func(NativeFunc::new(ctx, "os.exec", move |args| {
            let cmd = str_arg("os.exec", args, 0)?;
            sec.security().check_process(&cmd)?;
            let mut command = Command::new(&cmd);
            for arg in &args[1..] {
                command.arg(arg.to_string());
            }
            let output = command.output().map_err(RuntimeError::io)?;
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            Ok(Value::string(combined))
        })),
    );

    let sec = Arc::clone(ctx);
    ns.set(
        "exit",
        Value::Func(NativeFunc::new(ctx, "os.exit", move |args| {
            // Terminating the embedding host is a process-level capability.
            sec.security().check_process("exit")?;
            let code = if args.is_empty() {
                0.0
            } else {
                num_arg("os.exit", args, 0)?
            };
            std::process::exit(code as i32);
        })),
    );

    let sec = Arc::clone(ctx);
    ns.set(
        "readFile",
        Value::Func(NativeFunc::new(ctx, "os.readFile", move |args| {
            let path = str_arg("os.readFile", args, 0)?;
            sec.security().check_filesystem_read(&path)?;
            let contents = std::fs::read_to_string(&path).map_err(RuntimeError::io)?;
            Ok(Value::string(contents))
        })),
    );

    let sec = Arc::clone(ctx);
    ns.set(
        "writeFile",
        Value::Func(NativeFunc::new(ctx, "os.writeFile", move |args| {
            let path = str_arg("os.writeFile", args, 0)?;
            sec.security().check_filesystem_write(&path)?;
            let mut file = File::create(&path).map_err(RuntimeError::io)?;
            let written = write_parts(&mut file, &args[1..])?;
            Ok(Value::Number(written as f64))
        })),
    );

    let handle_ctx = Arc::clone(ctx);
    ns.set(
        "open",
        Value::Func(NativeFunc::new(ctx, "os.open", move |args| {
            let path = str_arg("os.open", args, 0)?;
            let mode = if args.len() > 1 {
                str_arg("os.open", args, 1)?
            } else {
                "r".to_string()
            };
            open_file(&handle_ctx, &path, &mode)
        })),
    );

    Value::Object(ns)
}

/// Write the string form of each part, skipping nil parts.
fn write_parts(w: &mut dyn Write, parts: &[Value]) -> Result<usize, RuntimeError> {
    let mut written = 0;
    for part in parts {
        if part.is_nil() {
            continue;
        }
        let text = part.to_string();
        w.write_all(text.as_bytes()).map_err(RuntimeError::io)?;
        written += text.len();
    }
    Ok(written)
}

/// Shared state behind an open file object.
///
/// The buffered reader is created lazily from a clone of the file handle the
/// first time a line is read; it is discarded on seek and write because its
/// buffered position would no longer match the file offset.
struct FileState {
    name: String,
    file: Option<File>,
    reader: Option<BufReader<File>>,
}

impl FileState {
    fn file(&self) -> Result<&File, RuntimeError> {
        let name = &self.name;
        self.file.as_ref().ok_or_else(|| RuntimeError::Io {
            message: format!("{}: file is closed", name),
        })
    }

    fn file_mut(&mut self) -> Result<&mut File, RuntimeError> {
        let name = &self.name;
        self.file.as_mut().ok_or_else(|| RuntimeError::Io {
            message: format!("{}: file is closed", name),
        })
    }
}

fn open_file(ctx: &Arc<Ctx>, path: &str, mode: &str) -> Result<Value, RuntimeError> {
    let mut options = OpenOptions::new();
    match mode {
        "r" => {
            ctx.security().check_filesystem_read(path)?;
            options.read(true);
        }
        "w" => {
            ctx.security().check_filesystem_write(path)?;
            options.write(true).create(true).truncate(true);
        }
        "rw" => {
            ctx.security().check_filesystem_read(path)?;
            ctx.security().check_filesystem_write(path)?;
            options.read(true).write(true).create(true);
        }
        "a" => {
            ctx.security().check_filesystem_write(path)?;
            options.append(true).create(true);
        }
        other => {
            return Err(RuntimeError::Type {
                msg: format!("os.open: invalid mode {:?}", other),
            })
        }
    }
    let file = options.open(path).map_err(RuntimeError::io)?;

    let state = Arc::new(Mutex::new(FileState {
        name: path.to_string(),
        file: Some(file),
        reader: None,
    }));

    let ob = Object::new();
    ob.set("name", Value::string(path));

    let st = Arc::clone(&state);
    ob.set(
        "close",
        Value::Func(NativeFunc::new(ctx, "file.close", move |_args| {
            let mut st = st.lock().expect("file state lock poisoned");
            st.file()?;
            st.file = None;
            st.reader = None;
            Ok(Value::Nil)
        })),
    );

    let st = Arc::clone(&state);
    ob.set(
        "readLine",
        Value::Func(NativeFunc::new(ctx, "file.readLine", move |_args| {
            let mut st = st.lock().expect("file state lock poisoned");
            if st.reader.is_none() {
                let clone = st.file()?.try_clone().map_err(RuntimeError::io)?;
                st.reader = Some(BufReader::new(clone));
            }
            let mut line = String::new();
            let n = match st.reader.as_mut() {
                Some(reader) => reader.read_line(&mut line).map_err(RuntimeError::io)?,
                None => 0,
            };
            if n == 0 {
                return Ok(Value::Nil);
            }
            // Strip one line terminator only; a carriage return that is
            // part of the line's content stays.
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            Ok(Value::string(line))
        })),
    );

    let st = Arc::clone(&state);
    ob.set(
        "seek",
        Value::Func(NativeFunc::new(ctx, "file.seek", move |args| {
            let offset = if args.is_empty() {
                0.0
            } else {
                num_arg("file.seek", args, 0)?
            };
            let whence = if args.len() > 1 {
                num_arg("file.seek", args, 1)?
            } else {
                0.0
            };
            let from = match whence as i64 {
                0 => SeekFrom::Start(offset as u64),
                1 => SeekFrom::Current(offset as i64),
                2 => SeekFrom::End(offset as i64),
                other => {
                    return Err(RuntimeError::Type {
                        msg: format!("file.seek: invalid whence {}", other),
                    })
                }
            };
            let mut st = st.lock().expect("file state lock poisoned");
            st.reader = None;
            let pos = st.file_mut()?.seek(from).map_err(RuntimeError::io)?;
            Ok(Value::Number(pos as f64))
        })),
    );

    let st = Arc::clone(&state);
    ob.set(
        "write",
        Value::Func(NativeFunc::new(ctx, "file.write", move |args| {
            let mut st = st.lock().expect("file state lock poisoned");
            st.reader = None;
            let written = write_parts(st.file_mut()?, args)?;
            Ok(Value::Number(written as f64))
        })),
    );

    let st = Arc::clone(&state);
    ob.set(
        "writeLine",
        Value::Func(NativeFunc::new(ctx, "file.writeLine", move |args| {
            let mut st = st.lock().expect("file state lock poisoned");
            st.reader = None;
            let file = st.file_mut()?;
            let n = write_parts(&mut *file, args)?;
            file.write_all(b"\n").map_err(RuntimeError::io)?;
            Ok(Value::Number((n + 1) as f64))
        })),
    );

    Ok(Value::Object(ob))
}
