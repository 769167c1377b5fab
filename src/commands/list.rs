use aws_sso_directory::{PageSource, Paginator};

use super::{print_rows, Error};
use crate::cmd::FormatCommonArgs;
use crate::utils::formatters::TableRow;

pub async fn exec_list<S>(mut paginator: Paginator<S>, formatting: &FormatCommonArgs) -> Result<(), Error>
where
    S: PageSource,
    S::Item: TableRow,
{
    let rows = paginator.try_collect().await?;
    tracing::debug!(operation = paginator.operation(), rows = rows.len(), "Listing complete");
    print_rows(&rows, formatting)
}
