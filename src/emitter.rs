//! Entry point driven by the report engine
//!
//! [`ExcelEmitter`] receives one callback per content event and hands it to
//! whichever layout handler is active. Only the document lifecycle lives here:
//! binding the output, creating the workbook and writing it at the end.

use crate::config::{keys, parse_bool, EmitterConfig};
use crate::content::*;
use crate::error::{EmitterError, Result};
use crate::handlers::{Context, Event, HandlerStack};
use crate::workbook::{flavor_for, Workbook};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Where the finished workbook goes
pub enum OutputDestination {
    Path(PathBuf),
    Writer(Box<dyn Write + Send>),
}

impl std::fmt::Debug for OutputDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputDestination::Path(path) => f.debug_tuple("Path").field(path).finish(),
            OutputDestination::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

impl From<PathBuf> for OutputDestination {
    fn from(path: PathBuf) -> Self {
        OutputDestination::Path(path)
    }
}

impl From<&str> for OutputDestination {
    fn from(path: &str) -> Self {
        OutputDestination::Path(PathBuf::from(path))
    }
}

/// Per-document state, created at report start
#[derive(Debug)]
struct Document {
    ctx: Context,
    stack: HandlerStack,
}

/// Report-to-spreadsheet emitter
///
/// # Examples
///
/// ```no_run
/// use excelemitter::{EmitterConfig, ExcelEmitter, OutputFormat};
/// use excelemitter::content::*;
///
/// let config = EmitterConfig::builder().with_format(OutputFormat::Xlsx).build();
/// let mut emitter = ExcelEmitter::initialize(config, Some("report.xlsx".into())).unwrap();
///
/// let report = ReportContent::default();
/// let page = PageContent::default();
/// let label = TextContent::new("Hello");
/// emitter.start_report(&report).unwrap();
/// emitter.start_page(&page).unwrap();
/// emitter.start_label(&label).unwrap();
/// emitter.end_page(&page).unwrap();
/// emitter.end_report(&report).unwrap();
/// ```
#[derive(Debug)]
pub struct ExcelEmitter {
    config: EmitterConfig,
    destination: Option<OutputDestination>,
    document: Option<Document>,
    poisoned: bool,
}

macro_rules! forward_events {
    ($($method:ident => $variant:ident($content:ty);)*) => {
        $(
            pub fn $method(&mut self, content: &$content) -> Result<()> {
                self.dispatch(Event::$variant(content))
            }
        )*
    };
}

impl ExcelEmitter {
    /// Bind configuration and output; fails when there is nowhere to write
    pub fn initialize(config: EmitterConfig, destination: Option<OutputDestination>) -> Result<Self> {
        let destination = destination.ok_or_else(|| {
            EmitterError::Config("no output stream or file path was bound".to_string())
        })?;
        log::debug!("Emitter initialized for {:?} output", config.format);
        Ok(ExcelEmitter {
            config,
            destination: Some(destination),
            document: None,
            poisoned: false,
        })
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn start_report(&mut self, report: &ReportContent) -> Result<()> {
        self.check_usable()?;
        if self.document.is_some() {
            return self.poison(EmitterError::UnexpectedEvent {
                handler: "Report",
                event: "start_report",
            });
        }
        let config = report_config(&self.config, &report.meta);
        let mut workbook = Workbook::new(flavor_for(config.format));
        if let Some(title) = report.title.as_deref().filter(|t| !t.is_empty()) {
            workbook.set_title(title);
        }
        log::info!("Started {:?} report", config.format);
        self.document = Some(Document {
            ctx: Context::new(config, workbook),
            stack: HandlerStack::new(),
        });
        Ok(())
    }

    /// Finish the workbook, write it out and hand it back
    pub fn end_report(&mut self, report: &ReportContent) -> Result<Workbook> {
        self.check_usable()?;
        let Some(document) = self.document.take() else {
            return Err(self.poison_err(EmitterError::UnexpectedEvent {
                handler: "Report",
                event: "end_report",
            }));
        };
        if document.stack.depth() != 1 {
            return Err(self.poison_err(EmitterError::UnexpectedEvent {
                handler: document.stack.top_name(),
                event: "end_report",
            }));
        }

        let mut workbook = document.ctx.workbook;
        if workbook.sheets().is_empty() {
            workbook.add_sheet(None);
        }
        if workbook.sheets().len() == 1 && workbook.sheets()[0].name().is_none() {
            let title = report.title.clone().or_else(|| workbook.title().map(str::to_string));
            if let (Some(title), Some(sheet)) = (title, workbook.sheet_mut(0)) {
                sheet.set_name(title);
            }
        }
        workbook.finalize_sheet_names();

        let destination = self.destination.take().ok_or_else(|| {
            EmitterError::Config("output destination was already used".to_string())
        })?;
        match destination {
            OutputDestination::Path(path) => {
                let file = File::create(&path)?;
                workbook.write(BufWriter::new(file))?;
                log::info!(
                    "Wrote {} sheet(s) to {}",
                    workbook.sheets().len(),
                    path.display()
                );
            }
            OutputDestination::Writer(writer) => {
                workbook.write(writer)?;
                log::info!("Wrote {} sheet(s) to stream", workbook.sheets().len());
            }
        }
        Ok(workbook)
    }

    forward_events! {
        start_page => StartPage(PageContent);
        end_page => EndPage(PageContent);
        start_table => StartTable(TableContent);
        end_table => EndTable(TableContent);
        start_table_band => StartTableBand(BandContent);
        end_table_band => EndTableBand(BandContent);
        start_table_group => StartTableGroup(GroupContent);
        end_table_group => EndTableGroup(GroupContent);
        start_row => StartRow(RowContent);
        end_row => EndRow(RowContent);
        start_cell => StartCell(CellContent);
        end_cell => EndCell(CellContent);
        start_list => StartList(ListContent);
        end_list => EndList(ListContent);
        start_list_band => StartListBand(BandContent);
        end_list_band => EndListBand(BandContent);
        start_list_group => StartListGroup(GroupContent);
        end_list_group => EndListGroup(GroupContent);
        start_container => StartContainer(ContainerContent);
        end_container => EndContainer(ContainerContent);
        start_text => Text(TextContent);
        start_label => Label(TextContent);
        start_auto_text => AutoText(TextContent);
        start_foreign => Foreign(ForeignContent);
        start_data => Data(DataContent);
        start_image => Image(ImageContent);
    }

    fn dispatch(&mut self, event: Event<'_>) -> Result<()> {
        self.check_usable()?;
        let Some(document) = self.document.as_mut() else {
            return self.poison(EmitterError::UnexpectedEvent {
                handler: "Report",
                event: event.name(),
            });
        };
        match document.stack.dispatch(&mut document.ctx, event) {
            Ok(()) => Ok(()),
            Err(err) => self.poison(err),
        }
    }

    fn check_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(EmitterError::Poisoned);
        }
        Ok(())
    }

    fn poison<T>(&mut self, err: EmitterError) -> Result<T> {
        Err(self.poison_err(err))
    }

    fn poison_err(&mut self, err: EmitterError) -> EmitterError {
        log::error!("Emitter stopped: {}", err);
        self.poisoned = true;
        self.document = None;
        err
    }
}

/// Document config with the report's user-property overrides applied
fn report_config(base: &EmitterConfig, meta: &ContentMeta) -> EmitterConfig {
    let mut config = base.clone();
    let flag = |key: &str| meta.user_property(key).and_then(parse_bool);
    if let Some(remove) = flag(keys::REMOVE_BLANK_ROWS) {
        config.remove_blank_rows = remove;
    }
    if let Some(display) = flag(keys::DISPLAY_GRIDLINES) {
        config.display_gridlines = Some(display);
    }
    if let Some(display) = flag(keys::DISPLAY_ROW_COL_HEADINGS) {
        config.display_row_col_headings = Some(display);
    }
    if let Some(display) = flag(keys::DISPLAY_ZEROS) {
        config.display_zeros = Some(display);
    }
    if let Some(display) = flag(keys::DISPLAY_FORMULAS) {
        config.display_formulas = Some(display);
    }
    config
}
