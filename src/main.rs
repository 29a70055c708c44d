use chrono::Local;
use clap::{Command, CommandFactory, Parser};
use clap_complete::{generate, Generator};
use gnn_agg::{
    cmd_args::{expand_config_names, Args},
    layers::Module,
    settings::Settings,
    GnnAggResult, GnnModel, GnnStatistics, Graph, NodeFeatures,
};
use log::info;
use std::io;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    simple_logger::init_with_level(log::Level::Info)?;
    let start_time = std::time::Instant::now();

    let mut config_names = vec![String::from("configs/default.toml")];
    let args = Args::parse();
    if let Some(generator) = args.generator {
        let mut cmd = Args::command();
        eprintln!("Generating completion file for {:?}...", generator);
        print_completions(generator, &mut cmd);
        return Ok(());
    }
    info!("{:?}", args);

    // config_names append args
    config_names.append(&mut expand_config_names(&args.config_names)?);

    let mut results = GnnAggResult::new();
    let settings = Settings::new(config_names)?;
    results.settings = Some(settings.clone());
    println!("{}", serde_json::to_string_pretty(&settings)?);
    // create the folder for output
    std::fs::create_dir_all(&settings.output_dir)?;

    let graph = Graph::new(settings.graph_path.as_str())?;
    let node_features = NodeFeatures::new(settings.features_path.as_str())?;
    info!(
        "graph with {} nodes and {} edges, {} feature columns",
        graph.num_nodes(),
        graph.num_edges(),
        node_features.num_columns()
    );

    let mut model = GnnModel::new(&settings.model_settings, settings.seed)?;

    // run the model
    let output = model.forward(&graph, &node_features)?;

    let mut stat = GnnStatistics::new();
    stat.num_nodes = graph.num_nodes();
    stat.num_edges = graph.num_edges();
    stat.num_parameters = model.num_parameters();
    stat.record_output(&output);

    // record the simulation time
    let simulation_time = start_time.elapsed().as_millis();
    let millis = simulation_time % 1000;
    let seconds = (simulation_time / 1000) % 60;
    let minutes = (simulation_time / 1000 / 60) % 60;
    let hours = simulation_time / 1000 / 60 / 60;
    stat.simulation_time = format!("{}:{}:{}.{:03}", hours, minutes, seconds, millis);

    results.stats = Some(stat);
    let current_time: String = Local::now().format("%Y-%m-%d-%H-%M-%S%.6f").to_string();
    let output_path = format!("{}/{}.json", settings.output_dir, current_time);

    println!("{}", serde_json::to_string_pretty(&results)?);
    // write json of results to output_path
    std::fs::write(&output_path, serde_json::to_string_pretty(&results)?)?;
    info!("result written to {}", output_path);
    Ok(())
}
