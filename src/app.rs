use std::sync::Arc;

use anyhow::Result;
use dioxus::prelude::*;
use log::{debug, error, info};
use rfd::FileDialog;

use crate::config::{default_db_path, GridConfig};
use crate::domain::entities::column::ColumnDef;
use crate::domain::entities::dataset::DatasetId;
use crate::infra::sqlite::repo::{DatasetSource, SqliteRepo};
use crate::platform::desktop::blocking::{fetch_in_background, run_blocking};
use crate::platform::desktop::delivery::NativeSaveDialog;
use crate::ui::state::app_state::{AppState, ResizeDrag};
use crate::ui::view::{
    body_cell_style, header_cell_style, resize_handle_style, root_container_style, snapshot,
    sort_indicator, status_message, table_container_style, table_style,
};
use crate::usecase::ports::report::ErrorReporter;
use crate::usecase::services::export_service::ExportFormat;
use crate::usecase::services::grid_controller::{FetchOutcome, FetchRequest, GridController};
use crate::usecase::services::import_service::ImportService;

const IMPORT_EXTENSIONS: [&str; 5] = ["csv", "xlsx", "xlsm", "xls", "ods"];

/// Mounts a grid over an imported dataset, one column per dataset column.
/// The returned request is the initial fetch, still to be run.
pub fn open_dataset_grid(
    repo: &Arc<SqliteRepo>,
    reporter: Arc<dyn ErrorReporter>,
    dataset_id: DatasetId,
    config: GridConfig,
) -> Result<(GridController, DatasetSource, FetchRequest)> {
    let columns = repo
        .dataset_columns(dataset_id)?
        .into_iter()
        .map(ColumnDef::new)
        .collect();
    let (grid, request) =
        GridController::mount(dataset_id.table_id(), columns, config, repo.clone(), reporter)?;
    Ok((grid, DatasetSource::new(repo.clone(), dataset_id), request))
}

fn load_grid(mut app: AppState, dataset_id: DatasetId) {
    let repo = app.repo.peek().clone();
    let reporter = app.reporter.peek().clone();
    match open_dataset_grid(&repo, reporter, dataset_id, GridConfig::default()) {
        Ok((grid, source, request)) => {
            app.grid.set(Some(grid));
            app.source.set(Some(source));
            app.selected_dataset_id.set(Some(dataset_id));
            *app.grid_epoch.write() += 1;
            app.status.set(format!("Loaded dataset #{}", dataset_id.0));
            dispatch(app, Some(request));
        }
        Err(err) => {
            error!("failed to open dataset #{}: {err:#}", dataset_id.0);
            app.grid.set(None);
            app.source.set(None);
            *app.grid_epoch.write() += 1;
            app.status.set(format!("Failed to open dataset: {err:#}"));
        }
    }
}

/// Applies a navigational change and dispatches whatever fetch it produced.
fn navigate(mut app: AppState, action: impl FnOnce(&mut GridController) -> Option<FetchRequest>) {
    let request = match app.grid.write().as_mut() {
        Some(grid) => action(grid),
        None => return,
    };
    dispatch(app, request);
    report_status(app);
}

/// Runs `request` on a worker thread and hands the response back to the
/// controller, following clamp refetches.
fn dispatch(app: AppState, request: Option<FetchRequest>) {
    let Some(request) = request else {
        return;
    };
    let Some(source) = app.source.peek().clone() else {
        return;
    };
    let epoch = *app.grid_epoch.peek();
    spawn(settle(app, source, epoch, request));
}

async fn settle(mut app: AppState, source: DatasetSource, epoch: u64, request: FetchRequest) {
    let mut pending = Some(request);
    while let Some(request) = pending.take() {
        let result = fetch_in_background(source.clone(), request.query.clone()).await;
        if *app.grid_epoch.peek() != epoch {
            debug!("dropping response #{} for a grid that was replaced", request.seq);
            return;
        }
        let outcome = match app.grid.write().as_mut() {
            Some(grid) => grid.complete(request.seq, result),
            None => return,
        };
        if let FetchOutcome::Clamped(next) = outcome {
            pending = Some(next);
        }
    }
    report_status(app);
}

fn report_status(mut app: AppState) {
    let message = app.reporter.peek().take_last();
    if let Some(message) = message {
        app.status.set(message);
    }
}

fn export_current(mut app: AppState, format: ExportFormat) {
    let delivery = NativeSaveDialog::new();
    let exported = app
        .grid
        .peek()
        .as_ref()
        .is_some_and(|grid| grid.export(format, &delivery));
    if exported {
        app.status.set(format!("Exported {format}"));
    }
    report_status(app);
}

#[component]
pub fn App() -> Element {
    let db_path = match default_db_path() {
        Ok(path) => path,
        Err(err) => {
            return rsx! {
                div {
                    p { "Unable to resolve database path: {err}" }
                }
            };
        }
    };

    let import_service = Arc::new(ImportService::new(db_path.clone()));
    let mut app = AppState::new(db_path);

    use_effect(move || {
        app.busy.set(true);
        let repo = app.repo.peek().clone();
        match repo.init().and_then(|_| repo.list_datasets()) {
            Ok(available) => {
                let first = available.first().map(|dataset| dataset.id);
                app.datasets.set(available);
                match first {
                    Some(dataset_id) => load_grid(app, dataset_id),
                    None => app
                        .status
                        .set("No datasets yet. Import a CSV or XLSX file.".to_string()),
                }
            }
            Err(err) => {
                error!("failed to initialize database: {err:#}");
                app.status.set(format!("Failed to initialize database: {err:#}"));
            }
        }
        app.busy.set(false);
    });

    let view = app.grid.read().as_ref().map(snapshot);
    let datasets = app.datasets.read().clone();
    let selected_dataset_id = *app.selected_dataset_id.read();
    let status_text = app.status.read().clone();
    let busy = *app.busy.read();

    rsx! {
        div {
            style: "{root_container_style()}",
            onmousemove: move |event: MouseEvent| {
                let Some(drag) = app.resize_drag.peek().clone() else {
                    return;
                };
                let width = drag.width_at(event.client_coordinates().x);
                if let Some(grid) = app.grid.write().as_mut() {
                    grid.resize_column(&drag.column_id, width);
                }
            },
            onmouseup: move |_| {
                if app.resize_drag.peek().is_some() {
                    app.resize_drag.set(None);
                }
            },

            div { style: "display: flex; gap: 8px; align-items: center; margin-bottom: 8px; flex-wrap: wrap;",
                button {
                    disabled: busy,
                    onclick: move |_| {
                        let Some(path) = FileDialog::new()
                            .add_filter("Tables", &IMPORT_EXTENSIONS)
                            .pick_file()
                        else {
                            return;
                        };
                        app.busy.set(true);
                        app.status.set(format!("Importing {}...", path.display()));
                        let repo = app.repo.peek().clone();
                        let import_service = import_service.clone();
                        spawn(async move {
                            let worker_path = path.clone();
                            let imported = run_blocking(move || {
                                import_service
                                    .import_path(&worker_path)
                                    .and_then(|results| Ok((results, repo.list_datasets()?)))
                            })
                            .await
                            .map_err(anyhow::Error::from)
                            .and_then(|imported| imported);
                            match imported {
                                Ok((results, available)) => {
                                    app.datasets.set(available);
                                    if let Some(first) = results.first() {
                                        load_grid(app, first.dataset_id);
                                    }
                                    info!("imported {} datasets from {}", results.len(), path.display());
                                    app.status.set(format!(
                                        "Imported {} dataset(s) from {}",
                                        results.len(),
                                        path.display()
                                    ));
                                }
                                Err(err) => {
                                    error!("import failed: {err:#}");
                                    app.status.set(format!("Import failed: {err:#}"));
                                }
                            }
                            app.busy.set(false);
                        });
                    },
                    "Import..."
                }
                span { "Dataset" }
                select {
                    disabled: busy || datasets.is_empty(),
                    onchange: move |event| {
                        if let Ok(id) = event.value().parse::<i64>() {
                            load_grid(app, DatasetId(id));
                        }
                    },
                    for dataset in datasets.iter() {
                        option {
                            key: "{dataset.id.0}",
                            value: "{dataset.id.0}",
                            selected: Some(dataset.id) == selected_dataset_id,
                            "{dataset.name} ({dataset.row_count})"
                        }
                    }
                }
                if let Some(view) = view.as_ref() {
                    input {
                        placeholder: "Search all columns",
                        value: "{view.global_filter}",
                        oninput: move |event| {
                            let next = event.value();
                            navigate(app, |grid| grid.set_global_filter(next));
                        }
                    }
                    button {
                        onclick: move |_| {
                            let saved = app.grid.peek().as_ref().is_some_and(|grid| grid.save_preferences());
                            if saved {
                                app.status.set("Layout saved".to_string());
                            }
                            report_status(app);
                        },
                        "Save layout"
                    }
                    button {
                        onclick: move |_| {
                            navigate(app, |grid| grid.reset_all());
                            app.status.set("Layout reset".to_string());
                            report_status(app);
                        },
                        "Reset layout"
                    }
                    button {
                        onclick: move |_| export_current(app, ExportFormat::Csv),
                        "Export CSV"
                    }
                    button {
                        onclick: move |_| export_current(app, ExportFormat::Xlsx),
                        "Export XLSX"
                    }
                    if view.selected_count > 0 {
                        span { style: "color: #555;", "{view.selected_count} selected" }
                    }
                }
            }

            if let Some(view) = view.as_ref() {
                div { style: "display: flex; gap: 12px; margin-bottom: 8px; flex-wrap: wrap;",
                    {view.toggles.iter().map(|toggle| {
                        let column_id = toggle.id.clone();
                        rsx!(
                            label { key: "{toggle.id}",
                                input {
                                    r#type: "checkbox",
                                    checked: toggle.visible,
                                    onclick: move |_| {
                                        if let Some(grid) = app.grid.write().as_mut() {
                                            grid.toggle_column_visibility(&column_id);
                                        }
                                    }
                                }
                                " {toggle.label}"
                            }
                        )
                    })}
                }

                div { style: "{table_container_style()}",
                    table { style: "{table_style(view.total_width)}",
                        thead {
                            tr {
                                {view.headers.iter().map(|header| {
                                    let style = header_cell_style(header.width, header.sticky_left);
                                    if header.is_selection {
                                        let all_selected = view.all_selected;
                                        return rsx!(
                                            th { key: "{header.id}", style: "{style}",
                                                input {
                                                    r#type: "checkbox",
                                                    checked: all_selected,
                                                    onclick: move |_| {
                                                        if let Some(grid) = app.grid.write().as_mut() {
                                                            grid.toggle_all_rows_selected();
                                                        }
                                                    }
                                                }
                                            }
                                        );
                                    }
                                    let sort_id = header.id.clone();
                                    let resize_id = header.id.clone();
                                    let width = header.width;
                                    let sortable = header.sortable;
                                    let resizable = header.resizable;
                                    let label = format!(
                                        "{}{}",
                                        header.label,
                                        sort_indicator(header.sort, header.sort_rank, view.multi_sort)
                                    );
                                    rsx!(
                                        th { key: "{header.id}", style: "{style}",
                                            span {
                                                style: if sortable { "cursor: pointer;" } else { "" },
                                                title: if sortable { "Click to sort, shift+click to add" } else { "" },
                                                onclick: move |event: MouseEvent| {
                                                    if !sortable {
                                                        return;
                                                    }
                                                    let multi = event.modifiers().shift();
                                                    navigate(app, |grid| grid.toggle_sorting(&sort_id, multi));
                                                },
                                                "{label}"
                                            }
                                            if resizable {
                                                div {
                                                    style: "{resize_handle_style()}",
                                                    onmousedown: move |event: MouseEvent| {
                                                        event.stop_propagation();
                                                        app.resize_drag.set(Some(ResizeDrag {
                                                            column_id: resize_id.clone(),
                                                            start_x: event.client_coordinates().x,
                                                            start_width: width,
                                                        }));
                                                    }
                                                }
                                            }
                                        }
                                    )
                                })}
                            }
                            tr {
                                {view.headers.iter().map(|header| {
                                    let style = header_cell_style(header.width, header.sticky_left);
                                    let filter_id = header.id.clone();
                                    let filterable = header.filterable;
                                    rsx!(
                                        th { key: "filter-{header.id}", style: "{style}",
                                            if filterable {
                                                input {
                                                    style: "width: 100%; box-sizing: border-box;",
                                                    placeholder: "Filter...",
                                                    value: "{header.filter}",
                                                    oninput: move |event| {
                                                        let next = event.value();
                                                        navigate(app, |grid| grid.set_column_filter(&filter_id, next));
                                                    }
                                                }
                                            }
                                        }
                                    )
                                })}
                            }
                        }
                        tbody {
                            if let Some(message) = status_message(view.status) {
                                tr {
                                    td {
                                        colspan: "{view.headers.len()}",
                                        style: "padding: 16px; text-align: center; color: #666;",
                                        "{message}"
                                    }
                                }
                            } else {
                                {view.rows.iter().map(|row| {
                                    let row_index = row.index;
                                    let selected = row.selected;
                                    rsx!(
                                        tr { key: "{row_index}",
                                            {view.headers.iter().zip(row.cells.iter()).map(|(header, text)| {
                                                let style = body_cell_style(header.width, header.sticky_left, selected);
                                                if header.is_selection {
                                                    rsx!(
                                                        td { style: "{style}",
                                                            input {
                                                                r#type: "checkbox",
                                                                checked: selected,
                                                                onclick: move |_| {
                                                                    if let Some(grid) = app.grid.write().as_mut() {
                                                                        grid.toggle_row_selected(row_index);
                                                                    }
                                                                }
                                                            }
                                                        }
                                                    )
                                                } else {
                                                    rsx!(td { style: "{style}", title: "{text}", "{text}" })
                                                }
                                            })}
                                        }
                                    )
                                })}
                            }
                        }
                    }
                }

                div { style: "display: flex; gap: 8px; align-items: center; margin-top: 8px;",
                    button {
                        disabled: !view.can_previous,
                        onclick: move |_| navigate(app, |grid| grid.first_page()),
                        "<<"
                    }
                    button {
                        disabled: !view.can_previous,
                        onclick: move |_| navigate(app, |grid| grid.previous_page()),
                        "<"
                    }
                    span { "{view.page_label}" }
                    button {
                        disabled: !view.can_next,
                        onclick: move |_| navigate(app, |grid| grid.next_page()),
                        ">"
                    }
                    button {
                        disabled: !view.can_next,
                        onclick: move |_| navigate(app, |grid| grid.last_page()),
                        ">>"
                    }
                    select {
                        onchange: move |event| {
                            if let Ok(size) = event.value().parse::<usize>() {
                                navigate(app, |grid| grid.set_page_size(size));
                            }
                        },
                        for size in view.page_size_options.iter().copied() {
                            option {
                                key: "{size}",
                                value: "{size}",
                                selected: size == view.page_size,
                                "Show {size}"
                            }
                        }
                    }
                    span { "{view.total_row_count} rows" }
                    if view.some_selected {
                        span { style: "color: #555;", "(partial selection)" }
                    }
                }
            }

            div { style: "margin-top: 8px; color: #333;", "{status_text}" }
        }
    }
}
