use std::time::SystemTime;

use barograph::{downsample, project, select, Field};
use clap::Args;
use eyre::Result;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::io::Output;
use crate::source::{load, WindowOpts};

const COLORS: [&str; 4] = ["#E9D758", "#EE7860", "#A1CDF4", "#593C8F"];

#[derive(Args, Debug)]
pub struct Opts {
    /// Plot title
    #[clap(long, default_value = "Weather Station")]
    title: String,

    /// Fields to chart (repeatable) [default: all]
    #[clap(long = "field")]
    fields: Vec<Field>,

    /// Maximum number of points per series (LTTB downsampling threshold)
    #[clap(long, env = "BAROGRAPH_PLOT_THRESHOLD", default_value_t = 2000)]
    threshold: usize,

    #[clap(flatten)]
    window: WindowOpts,

    /// Output file [default: stdout]
    #[clap(long, default_value = "stdout")]
    output: String,

    /// Input files [default: stdin]
    pub files: Vec<String>,
}

pub async fn plot(opts: &Opts) -> Result<()> {
    let window = opts.window.window(SystemTime::now())?;
    let readings = select(load(&opts.files).await?, window.as_ref());
    if readings.is_empty() {
        eyre::bail!("no data to plot");
    }

    let fields: &[Field] = if opts.fields.is_empty() {
        &Field::ALL
    } else {
        &opts.fields
    };

    let mut charts = Vec::with_capacity(fields.len());
    for (i, &field) in fields.iter().enumerate() {
        let points = downsample(&project(&readings, field), opts.threshold)?;
        debug!(field = field.name(), points = points.len(), "plotting series");
        charts.push(json!({
            "label": field.name(),
            "unit": field.unit(),
            "color": COLORS[i % COLORS.len()],
            "points": points.iter().map(|&(x, y)| [x, y]).collect::<Vec<_>>(),
        }));
    }

    let html = generate_plot_html(&opts.title, &serde_json::to_string(&charts)?);

    let mut output = Output::from_filename(&opts.output).await?;
    output.write_all(html.as_bytes()).await?;
    output.flush().await?;

    Ok(())
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn generate_plot_html(title: &str, charts: &str) -> String {
    let title = escape_html(title);
    // Keep the payload from closing the script element early.
    let charts = charts.replace("</", "<\\/");
    format!(
        r##"<!doctype html>
<html>
<head>
  <title>{title}</title>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <style>
    * {{ box-sizing: border-box; }}
    body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 20px; background: #0f1419; color: #e6edf3; }}
    .container {{ max-width: 1600px; margin: 0 auto; }}
    h1 {{ font-size: 24px; font-weight: 600; margin: 0 0 20px 0; }}
    h2 {{ font-size: 15px; font-weight: 500; margin: 0 0 8px 0; color: #8b949e; }}
    .chart {{ background: #161b22; border: 1px solid #30363d; border-radius: 8px; padding: 20px; margin-bottom: 16px; }}
    canvas {{ width: 100%; }}
  </style>
</head>
<body>
  <div class="container">
    <h1>{title}</h1>
    <div id="charts"></div>
  </div>
  <script>
    const charts = {charts};
    const H = 260;

    function pad2(n) {{ return String(n).padStart(2, '0'); }}
    function formatTime(ms, span) {{
      const d = new Date(ms);
      const day = pad2(d.getMonth() + 1) + '-' + pad2(d.getDate());
      const hm = pad2(d.getHours()) + ':' + pad2(d.getMinutes());
      return span > 2 * 86400000 ? day : (span > 86400000 ? day + ' ' + hm : hm);
    }}

    function draw(chart, canvas) {{
      const ctx = canvas.getContext('2d');
      const dpr = window.devicePixelRatio || 1;
      const rect = canvas.getBoundingClientRect();
      canvas.width = rect.width * dpr;
      canvas.height = H * dpr;
      ctx.scale(dpr, dpr);
      const W = rect.width;
      const pad = {{top: 10, right: 20, bottom: 30, left: 70}};
      const pw = W - pad.left - pad.right;
      const ph = H - pad.top - pad.bottom;

      ctx.clearRect(0, 0, W, H);
      const pts = chart.points;
      if (pts.length === 0) return;

      let xMin = Infinity, xMax = -Infinity, yMin = Infinity, yMax = -Infinity;
      for (const [x, y] of pts) {{
        if (x < xMin) xMin = x;
        if (x > xMax) xMax = x;
        if (y < yMin) yMin = y;
        if (y > yMax) yMax = y;
      }}

      function xToP(x) {{ return pad.left + (x - xMin) / (xMax - xMin || 1) * pw; }}
      function yToP(y) {{ return pad.top + ph - (y - yMin) / (yMax - yMin || 1) * ph; }}

      ctx.strokeStyle = '#30363d';
      ctx.lineWidth = 1;
      ctx.fillStyle = '#8b949e';
      ctx.font = '11px monospace';
      for (let i = 0; i <= 4; i++) {{
        const y = pad.top + (ph / 4) * i;
        ctx.beginPath(); ctx.moveTo(pad.left, y); ctx.lineTo(W - pad.right, y); ctx.stroke();
        ctx.textAlign = 'right';
        ctx.fillText((yMax - (i / 4) * (yMax - yMin)).toFixed(1), pad.left - 8, y + 4);
      }}

      ctx.textAlign = 'center';
      for (let i = 0; i <= 5; i++) {{
        const val = xMin + (i / 5) * (xMax - xMin);
        ctx.fillText(formatTime(val, xMax - xMin), pad.left + (pw / 5) * i, H - 10);
      }}

      ctx.strokeStyle = chart.color;
      ctx.lineWidth = 1.5;
      ctx.beginPath();
      pts.forEach(([x, y], i) => {{
        if (i === 0) ctx.moveTo(xToP(x), yToP(y)); else ctx.lineTo(xToP(x), yToP(y));
      }});
      ctx.stroke();
    }}

    function render() {{
      const root = document.getElementById('charts');
      root.innerHTML = '';
      for (const chart of charts) {{
        const div = document.createElement('div');
        div.className = 'chart';
        const h2 = document.createElement('h2');
        h2.textContent = chart.label + ' (' + chart.unit + ') · ' + chart.points.length + ' points';
        const canvas = document.createElement('canvas');
        canvas.height = H;
        div.appendChild(h2);
        div.appendChild(canvas);
        root.appendChild(div);
        draw(chart, canvas);
      }}
    }}

    render();
    window.addEventListener('resize', render);
  </script>
</body>
</html>"##
    )
}
