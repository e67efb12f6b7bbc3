/*!

This is the long-form manual for `riding_analysis` and `ridings`.

## Input formats

The candidate tables are expected to be already normalized: one row per
candidate, with a header row. The following columns are read:

* `distnum` the number of the electoral district (required)
* `distname` the name of the electoral district (required)
* `party` the party of the candidate (required)
* `voteshare` the percentage of votes obtained by the candidate, between 0 and 100 (required)
* `candidate` the name of the candidate
* `numvotes` the number of votes obtained by the candidate
* `province` the province of the district. When this column is missing or empty,
  the province is deduced from the first two digits of the district number.

Other columns are ignored. The parties may be written with their code (`BLOC`, `Bloc`,
`CPC`, `GPC`, `LPC`, `NDP`) or with the name used by Elections Canada (`Conservative`,
`Liberal`, `NDP-New Democratic Party`, `Green Party`, `Bloc Québécois`).
All the other parties are counted as independents (`IND`).

### `csv`

Comma separated values.

### `xlsx`

An Excel spreadsheet. By default the first worksheet is read, another one can be
chosen with `--excel-worksheet-name`.

## Analyses

### Ridings

Each district is summarized with the share of each party, the winner, the winning share
and the margin of each party (its share minus the winning share). When two parties have the
same share, the party whose code comes first in alphabetical order wins.

### Unified parties

`--merge NDP --merge GPC --merged-name GDP` pools the votes of the NDP and the Greens
into a new party `GDP` and elects again every riding. Two variants are computed:

* the weak variant, in which the merged party wins a riding only if its pooled share
  is larger than every other share;
* the strong variant, which additionally gives to the merged party the ridings it lost
  by less than `--strong-threshold` points (10 by default), including the ridings where
  it tied the leader and lost on the alphabetical order.

### Near-misses

`--near-miss CPC` lists the ridings that the party lost by less than 10 points, from the
heaviest loss to the closest one.

### Swings

When `--previous` points to the candidate table of an earlier election, the change of share
of every party is computed for each district present in both elections. The districts that
only exist in the current election are reported without swings, unless the configuration
sets `rejectUnmatchedDistricts`, in which case the analysis fails. The summary lists the
swings one party at a time (`swings`) and one district at a time (`byDistrict`).

### Dominated ridings

The summary counts the ridings won with more than `dominationShare` percent of the votes
(60 by default), by party and by province, and lists their district numbers.

### Library only

[`results_for_district`](crate::results_for_district) extracts the candidates of one district
from a candidate table. The command line does not use it.

## Configuration

All the options can be given in a JSON file with `--config`:

```json
{
  "outputSettings": { "contestName": "43rd general election", "outputPath": "summary.json" },
  "elections": [
    { "name": "2019", "provider": "csv", "filePath": "candidates_2019.csv" },
    { "name": "2015", "provider": "xlsx", "filePath": "candidates_2015.xlsx" }
  ],
  "analysis": {
    "mergeParties": ["NDP", "GPC"],
    "mergedPartyName": "GDP",
    "strongMergeThreshold": 10.0,
    "nearMissParties": ["CPC", "NDP"],
    "nearMissFloor": -10.0,
    "dominationShare": 60.0,
    "swingParties": ["BLOC", "CPC", "GPC", "LPC", "NDP"],
    "rejectUnmatchedDistricts": false
  }
}
```

The first election is the current one, the second one (optional) is the previous one. The
file paths are relative to the configuration file. The options of the command line take
precedence over the configuration file.

*/
