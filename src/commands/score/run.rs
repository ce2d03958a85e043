use super::*;

pub fn run(args: ScoreArgs) -> Result<()> {
    let started_at = Utc::now();
    let config = resolve_config(args.config.as_deref(), &args.bootstrap)?;
    info!(
        samples = config.bootstrap.samples,
        seed = config.bootstrap.seed,
        alpha = config.bootstrap.alpha,
        "scoring config resolved"
    );

    let dataset = load_dataset(&args)?;
    info!(
        posters = dataset.ground_truth.len(),
        models = dataset.models.len(),
        "loaded benchmark inputs"
    );

    let scores = score_all(&dataset, &config, args.workers)?;

    let summaries = dataset
        .models
        .iter()
        .map(|model| {
            let model_scores = scores
                .get(&model.name)
                .map(Vec::as_slice)
                .unwrap_or_default();
            summarize_model(model, model_scores, &config.bootstrap)
        })
        .collect::<Vec<RunSummary>>();
    for summary in &summaries {
        info!(
            model = %summary.model,
            app_quality = summary.app_quality.mean.unwrap_or(0.0),
            app_core = summary.app_core.mean.unwrap_or(0.0),
            missing = summary.missing_predictions,
            parse_failures = summary.parse_failures,
            "model summary"
        );
    }

    let comparisons = compare_all(
        &scores,
        &[CompareMetric::AppQuality, CompareMetric::AppCore],
        &config.bootstrap,
    )?;

    let meta = build_run_meta(&args, &dataset, &config, started_at)?;

    let summary_path = args.out.join("summary.json");
    let comparisons_path = args.out.join("comparisons.json");
    let scores_path = args.out.join("scores.json");
    let meta_path = args.out.join("meta.json");

    write_json_pretty(&summary_path, &summaries)?;
    write_json_pretty(&comparisons_path, &comparisons)?;
    write_json_pretty(&scores_path, &scores)?;
    write_json_pretty(&meta_path, &meta)?;

    info!(
        out = %args.out.display(),
        models = summaries.len(),
        comparisons = comparisons.len(),
        "scoring run completed"
    );

    Ok(())
}

/// Scores every (model, poster) pair on a bounded pool, then restores poster
/// order per model so resampling sees a deterministic sequence.
pub(super) fn score_all(
    dataset: &Dataset,
    config: &ScoringConfig,
    workers: Option<usize>,
) -> Result<ModelScores> {
    let workers = workers
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|count| count.get())
                .unwrap_or(1)
        })
        .max(1);
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("failed to build scoring thread pool")?;

    let tasks = dataset
        .models
        .iter()
        .flat_map(|model| dataset.ground_truth.iter().map(move |gold| (model, gold)))
        .collect::<Vec<(&ModelPredictions, &ExtractionRecord)>>();
    debug!(tasks = tasks.len(), workers, "scoring posters");

    let scored = pool.install(|| {
        tasks
            .par_iter()
            .map(|(model, gold)| {
                let prediction = model.prediction(&gold.poster_id);
                (model.name.as_str(), score_poster_bytes(gold, prediction, config))
            })
            .collect::<Vec<(&str, PosterScore)>>()
    });

    let mut by_model = dataset
        .models
        .iter()
        .map(|model| (model.name.clone(), Vec::<PosterScore>::new()))
        .collect::<ModelScores>();
    for (model, score) in scored {
        if score.status == PredictionStatus::ParseFailure {
            debug!(model = %model, poster = %score.poster_id, "prediction failed to parse");
        }
        by_model.entry(model.to_string()).or_default().push(score);
    }
    for scores in by_model.values_mut() {
        scores.sort_by(|left, right| left.poster_id.cmp(&right.poster_id));
    }

    Ok(by_model)
}

fn build_run_meta(
    args: &ScoreArgs,
    dataset: &Dataset,
    config: &ScoringConfig,
    started_at: chrono::DateTime<Utc>,
) -> Result<RunMeta> {
    let prediction_seeds = dataset
        .models
        .iter()
        .flat_map(|model| model.seeds.iter().copied())
        .collect::<BTreeSet<u64>>()
        .into_iter()
        .collect::<Vec<u64>>();

    Ok(RunMeta {
        manifest_version: RUN_MANIFEST_VERSION,
        run_id: utc_compact_string(started_at),
        generated_at: now_utc_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        ground_truth_dir: args.ground_truth_dir.display().to_string(),
        predictions_dir: args.predictions_dir.display().to_string(),
        ground_truth_sha256: sha256_files(&dataset.ground_truth_paths)?,
        counts: dataset.counts.clone(),
        models: dataset
            .models
            .iter()
            .map(|model| model.name.clone())
            .collect(),
        prediction_seeds,
        ground_truth_cost_usd: dataset.ground_truth_cost_usd,
        config: config.clone(),
    })
}
