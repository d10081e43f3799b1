use anyhow::Result;
use std::io::Write;

pub type EmitResult = Result<()>;

pub trait Emitter {
    type Item;

    fn emit<W: Write>(&self, item: &Self::Item, writer: &mut W) -> EmitResult;

    fn emit_to_string(&self, item: &Self::Item) -> Result<String> {
        let mut buffer = Vec::new();
        self.emit(item, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
